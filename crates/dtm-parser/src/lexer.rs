//! Lexical primitives shared by the color and dimension codecs.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1, take_while_m_n},
    character::complete::{char, digit1, multispace0},
    combinator::{map_res, opt, recognize, verify},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

/// Parse a number with optional sign and fraction (`-1`, `+2.5`, `.5`).
pub fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(pair(
            opt(alt((char('-'), char('+')))),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit1)))),
                recognize(pair(char('.'), digit1)),
            )),
        )),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Parse an unsigned decimal made of digits and dots (`0.5`, `1`, `.25`).
pub fn unsigned_decimal(input: &str) -> IResult<&str, f64> {
    map_res(
        take_while1(|c: char| c.is_ascii_digit() || c == '.'),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Parse an integer of one to three digits.
pub fn small_integer(input: &str) -> IResult<&str, u32> {
    map_res(
        take_while_m_n(1, 3, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<u32>(),
    )(input)
}

/// Parse an integer percentage (`50%`), returned as a 0..1 fraction.
pub fn percentage(input: &str) -> IResult<&str, f64> {
    let (rest, value) = verify(terminated(small_integer, char('%')), |v: &u32| *v <= 100)(input)?;
    Ok((rest, value as f64 / 100.0))
}

/// Parse a unit suffix (`px`, `rem`, `%`). May be empty.
pub fn unit(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_ascii_alphabetic() || c == '%')(input)
}

/// Parse a number followed by an optional unit (`12px`, `1.5`, `100%`).
pub fn dimension(input: &str) -> IResult<&str, (f64, &str)> {
    pair(number, unit)(input)
}

/// Parse the digits of a `#hex` color.
pub fn hex_digits(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), take_while1(|c: char| c.is_ascii_hexdigit()))(input)
}

/// Surround a parser with optional whitespace.
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// A comma separator with optional surrounding whitespace.
pub fn comma(input: &str) -> IResult<&str, char> {
    ws(char(','))(input)
}

/// Parse `name(args)`.
pub fn function_call<'a, F, O>(name: &'static str, args: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(tuple((tag(name), char('('))), args, char(')'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number() {
        assert_eq!(number("12px"), Ok(("px", 12.0)));
        assert_eq!(number("-1.5"), Ok(("", -1.5)));
        assert_eq!(number(".5rem"), Ok(("rem", 0.5)));
        assert!(number("px").is_err());
    }

    #[test]
    fn test_dimension() {
        assert_eq!(dimension("16px"), Ok(("", (16.0, "px"))));
        assert_eq!(dimension("100%"), Ok(("", (100.0, "%"))));
        assert_eq!(dimension("4"), Ok(("", (4.0, ""))));
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage("50%"), Ok(("", 0.5)));
        assert!(percentage("150%").is_err());
        assert!(percentage("50").is_err());
    }

    #[test]
    fn test_small_integer_limits_digits() {
        assert_eq!(small_integer("255"), Ok(("", 255)));
        assert_eq!(small_integer("2555"), Ok(("5", 255)));
    }

    #[test]
    fn test_function_call() {
        let mut parser = function_call("rgb", ws(small_integer));
        assert_eq!(parser("rgb( 12 )"), Ok(("", 12)));
        assert!(parser("rgba(12)").is_err());
    }
}
