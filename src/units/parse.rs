// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A small recursive descent parser for unit expressions.
//!
//! Grammar:
//!
//! ```text
//! expr := term (('*' | '/') term)*
//! term := atom ('^' integer)?
//! atom := symbol | '1' | '(' expr ')'
//! ```

use std::iter::Peekable;
use std::str::Chars;

use super::{Dims, Unit};
use crate::Error;

/// Looks up a unit symbol in the table of known units.
fn known_unit(symbol: &str) -> Option<Unit> {
    let (scale, dims) = match symbol {
        "g" => (1e-3, Dims::MASS),
        "kg" => (1.0, Dims::MASS),
        "t" => (1e3, Dims::MASS),

        "m" => (1.0, Dims::LENGTH),
        "l" => (1e-3, Dims::VOLUME),

        "s" => (1.0, Dims::TIME),
        "min" => (60.0, Dims::TIME),
        "h" => (3600.0, Dims::TIME),
        "d" => (86400.0, Dims::TIME),

        "J" => (1.0, Dims::ENERGY),
        "kJ" => (1e3, Dims::ENERGY),
        "MJ" => (1e6, Dims::ENERGY),
        "GJ" => (1e9, Dims::ENERGY),
        "Wh" => (3.6e3, Dims::ENERGY),
        "kWh" => (3.6e6, Dims::ENERGY),
        "MWh" => (3.6e9, Dims::ENERGY),
        "GWh" => (3.6e12, Dims::ENERGY),
        "TWh" => (3.6e15, Dims::ENERGY),

        "W" => (1.0, Dims::POWER),
        "kW" => (1e3, Dims::POWER),
        "MW" => (1e6, Dims::POWER),
        "GW" => (1e9, Dims::POWER),
        "TW" => (1e12, Dims::POWER),

        "EUR" => (1.0, Dims::CURRENCY),
        "kEUR" => (1e3, Dims::CURRENCY),
        "MEUR" => (1e6, Dims::CURRENCY),
        _ => return None,
    };
    Some(Unit::from_parts(symbol, scale, dims))
}

struct Parser<'a> {
    input: &'a str,
    chars: Peekable<Chars<'a>>,
}

pub(super) fn parse_unit(input: &str) -> Result<Unit, Error> {
    let mut parser = Parser {
        input,
        chars: input.chars().peekable(),
    };
    let unit = parser.expr()?;
    parser.skip_whitespace();
    if let Some(c) = parser.chars.peek().copied() {
        return Err(parser.error(&format!("unexpected character '{c}'")));
    }
    Ok(Unit::from_parts(input.trim(), unit.scale, unit.dims))
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> Error {
        Error::invalid_unit(format!("Invalid unit '{}': {}.", self.input, reason))
    }

    fn out_of_range(&self) -> Error {
        self.error("dimension exponent out of range")
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn expr(&mut self) -> Result<Unit, Error> {
        let mut unit = self.term()?;
        loop {
            self.skip_whitespace();
            match self.chars.peek().copied() {
                Some('*') => {
                    self.chars.next();
                    let rhs = self.term()?;
                    unit = unit.try_mul(&rhs).map_err(|_| self.out_of_range())?;
                }
                Some('/') => {
                    self.chars.next();
                    let rhs = self.term()?;
                    unit = unit.try_div(&rhs).map_err(|_| self.out_of_range())?;
                }
                _ => return Ok(unit),
            }
        }
    }

    fn term(&mut self) -> Result<Unit, Error> {
        let unit = self.atom()?;
        self.skip_whitespace();
        if self.chars.next_if_eq(&'^').is_none() {
            return Ok(unit);
        }
        self.skip_whitespace();
        let mut exponent = String::new();
        if let Some(sign) = self.chars.next_if_eq(&'-') {
            exponent.push(sign);
        }
        while let Some(digit) = self.chars.next_if(|c| c.is_ascii_digit()) {
            exponent.push(digit);
        }
        let exponent = exponent
            .parse::<i8>()
            .map_err(|_| self.error("expected an integer exponent after '^'"))?;
        unit.powi(exponent).map_err(|_| self.out_of_range())
    }

    fn atom(&mut self) -> Result<Unit, Error> {
        self.skip_whitespace();
        match self.chars.peek().copied() {
            Some('(') => {
                self.chars.next();
                let unit = self.expr()?;
                self.skip_whitespace();
                if self.chars.next_if_eq(&')').is_none() {
                    return Err(self.error("missing closing bracket"));
                }
                Ok(unit)
            }
            Some('1') => {
                self.chars.next();
                Ok(Unit::dimensionless())
            }
            Some(c) if c.is_alphabetic() => {
                let mut symbol = String::new();
                while let Some(c) = self.chars.next_if(|c| c.is_alphabetic()) {
                    symbol.push(c);
                }
                known_unit(&symbol).ok_or_else(|| self.error(&format!("unknown unit '{symbol}'")))
            }
            Some(c) => Err(self.error(&format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let unit = parse_unit(" EUR / ( t / h ) ").unwrap();
        assert_eq!(unit.symbol(), "EUR / ( t / h )");
        assert_eq!(unit.dims, Dims([-1, 0, 1, 1]));

        assert_eq!(parse_unit("1").unwrap(), Unit::dimensionless());
        assert_eq!(parse_unit("h^-2").unwrap().dims, Dims([0, 0, -2, 0]));
        assert_eq!(parse_unit("l/h").unwrap().dims, Dims([0, 3, -1, 0]));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_unit("furlong").is_err_and(|e| e
            == Error::invalid_unit("Invalid unit 'furlong': unknown unit 'furlong'.")));
        assert!(parse_unit("(MW").is_err_and(|e| e
            == Error::invalid_unit("Invalid unit '(MW': missing closing bracket.")));
        assert!(parse_unit("MW^x").is_err_and(|e| e
            == Error::invalid_unit(
                "Invalid unit 'MW^x': expected an integer exponent after '^'."
            )));
        assert!(parse_unit("MW)").is_err_and(|e| e
            == Error::invalid_unit("Invalid unit 'MW)': unexpected character ')'.")));
        assert!(parse_unit("").is_err_and(|e| e
            == Error::invalid_unit("Invalid unit '': unexpected end of input.")));
    }

    #[test]
    fn test_parse_exponent_overflow() {
        assert!(parse_unit("l^100").is_err_and(|e| e
            == Error::invalid_unit("Invalid unit 'l^100': dimension exponent out of range.")));
        assert!(parse_unit("m^100*m^100").is_err_and(|e| e
            == Error::invalid_unit(
                "Invalid unit 'm^100*m^100': dimension exponent out of range."
            )));
        assert!(parse_unit("m^100/m^-100").is_err_and(|e| e
            == Error::invalid_unit(
                "Invalid unit 'm^100/m^-100': dimension exponent out of range."
            )));
        assert!(parse_unit("MW^200").is_err_and(|e| e
            == Error::invalid_unit(
                "Invalid unit 'MW^200': expected an integer exponent after '^'."
            )));
        assert!(crate::Quantity::parse(1.0, "l^100").is_err());
        assert_eq!(parse_unit("m^100/m^100").unwrap().dims, Dims::default());
    }
}
