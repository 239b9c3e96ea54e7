//! Pure arithmetic evaluation for resolved formula text.
//!
//! Grammar: `+ - * /`, unary sign, parentheses, decimal literals and the
//! functions `floor ceil round abs min max`. Anything else is an error;
//! the formula layer turns errors into a neutral `0`.

use crate::core::FormulaError;

/// Deepest nesting of parentheses, calls and unary signs accepted.
pub const MAX_DEPTH: usize = 256;

/// Evaluate an arithmetic expression.
///
/// ```
/// use sheet_effects::formula::arith::evaluate;
///
/// assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
/// assert_eq!(evaluate("floor((13 - 10) / 2)").unwrap(), 1.0);
/// assert!(evaluate("1d6").is_err());
/// ```
pub fn evaluate(text: &str) -> Result<f64, FormulaError> {
    let mut parser = Parser {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Err(parser.error());
    }
    if !value.is_finite() {
        return Err(FormulaError::NotFinite(text.to_string()));
    }
    Ok(value)
}

/// Format a number for substitution into formula text.
///
/// Integral values print without a fractional part so that the result
/// stays valid dice notation (`2d6`, not `2.0d6`).
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self) -> FormulaError {
        FormulaError::syntax(self.text, self.pos)
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<f64, FormulaError>,
    ) -> Result<f64, FormulaError> {
        if self.depth >= MAX_DEPTH {
            return Err(FormulaError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.term()?;
        loop {
            if self.eat(b'+') {
                value += self.term()?;
            } else if self.eat(b'-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.unary()?;
        loop {
            if self.eat(b'*') {
                value *= self.unary()?;
            } else if self.eat(b'/') {
                value /= self.unary()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<f64, FormulaError> {
        if self.eat(b'-') {
            return Ok(-self.nested(Self::unary)?);
        }
        if self.eat(b'+') {
            return self.nested(Self::unary);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<f64, FormulaError> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let value = self.nested(Self::expr)?;
                if !self.eat(b')') {
                    return Err(self.error());
                }
                Ok(value)
            }
            Some(b) if b.is_ascii_digit() || b == b'.' => self.number(),
            Some(b) if b.is_ascii_alphabetic() => self.call(),
            _ => Err(self.error()),
        }
    }

    fn number(&mut self) -> Result<f64, FormulaError> {
        let start = self.pos;
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_digit() || self.bytes[self.pos] == b'.')
        {
            self.pos += 1;
        }
        self.text[start..self.pos]
            .parse()
            .map_err(|_| FormulaError::syntax(self.text, start))
    }

    fn call(&mut self) -> Result<f64, FormulaError> {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_alphabetic() {
            self.pos += 1;
        }
        let name = &self.text[start..self.pos];
        if !self.eat(b'(') {
            return Err(FormulaError::syntax(self.text, start));
        }

        let mut args = vec![self.nested(Self::expr)?];
        while self.eat(b',') {
            args.push(self.nested(Self::expr)?);
        }
        if !self.eat(b')') {
            return Err(self.error());
        }

        match (name, args.as_slice()) {
            ("floor", [x]) => Ok(x.floor()),
            ("ceil", [x]) => Ok(x.ceil()),
            ("round", [x]) => Ok(x.round()),
            ("abs", [x]) => Ok(x.abs()),
            ("min", [first, rest @ ..]) => Ok(rest.iter().fold(*first, |a, b| a.min(*b))),
            ("max", [first, rest @ ..]) => Ok(rest.iter().fold(*first, |a, b| a.max(*b))),
            ("floor" | "ceil" | "round" | "abs", _) => Err(FormulaError::syntax(self.text, start)),
            _ => Err(FormulaError::UnknownFunction(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(evaluate("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("12 / 4 / 3").unwrap(), 1.0);
    }

    #[test]
    fn test_unary() {
        assert_eq!(evaluate("-3").unwrap(), -3.0);
        assert_eq!(evaluate("2 - -3").unwrap(), 5.0);
        assert_eq!(evaluate("+4").unwrap(), 4.0);
    }

    #[test]
    fn test_functions() {
        assert_eq!(evaluate("floor(7 / 2)").unwrap(), 3.0);
        assert_eq!(evaluate("ceil(7 / 2)").unwrap(), 4.0);
        assert_eq!(evaluate("max(1, 5, 3)").unwrap(), 5.0);
        assert_eq!(evaluate("min(4, 2)").unwrap(), 2.0);
        assert_eq!(evaluate("abs(-2.5)").unwrap(), 2.5);
    }

    #[test]
    fn test_errors() {
        assert!(evaluate("").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(2").is_err());
        assert!(evaluate("2 3").is_err());
        assert!(matches!(evaluate("1 / 0"), Err(FormulaError::NotFinite(_))));
        assert!(matches!(
            evaluate("sqrt(4)"),
            Err(FormulaError::UnknownFunction(_))
        ));
        assert!(evaluate("floor(1, 2)").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let ok = format!("{}1{}", "(".repeat(MAX_DEPTH - 1), ")".repeat(MAX_DEPTH - 1));
        assert_eq!(evaluate(&ok).unwrap(), 1.0);

        let deep = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(evaluate(&deep), Err(FormulaError::TooDeep(MAX_DEPTH)));

        let signs = format!("{}1", "-".repeat(200_000));
        assert_eq!(evaluate(&signs), Err(FormulaError::TooDeep(MAX_DEPTH)));

        let calls = format!("{}1{}", "abs(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(evaluate(&calls), Err(FormulaError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(2.5), "2.5");
    }
}
