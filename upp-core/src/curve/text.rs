use crate::{Curve, CurveError, Element, Point, Rational, Segment, Sequence};
use std::str::FromStr;

impl FromStr for Curve {
    type Err = CurveError;

    /// Reads back the [`Display`](std::fmt::Display) form,
    /// `Curve(Sequence([Point(0, 0), Segment(0, 1, 0, 2)]), 0, 1, 2)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor { rest: s };
        cursor.eat("Curve(")?;
        cursor.eat("Sequence(")?;
        cursor.eat("[")?;
        let mut elements = Vec::new();
        if !cursor.peek("]") {
            loop {
                elements.push(cursor.element()?);
                if !cursor.peek(",") {
                    break;
                }
                cursor.eat(",")?;
            }
        }
        cursor.eat("]")?;
        cursor.eat(")")?;
        cursor.eat(",")?;
        let start = cursor.number()?;
        cursor.eat(",")?;
        let length = cursor.number()?;
        cursor.eat(",")?;
        let height = cursor.number()?;
        cursor.eat(")")?;
        cursor.finish()?;

        Curve::new(Sequence::new(elements)?, start, length, height)
    }
}

struct Cursor<'a> {
    rest: &'a str,
}

impl Cursor<'_> {
    fn peek(&mut self, token: &str) -> bool {
        self.rest = self.rest.trim_start();
        self.rest.starts_with(token)
    }

    fn eat(&mut self, token: &str) -> Result<(), CurveError> {
        if !self.peek(token) {
            return Err(self.unexpected(token));
        }
        self.rest = &self.rest[token.len()..];
        Ok(())
    }

    fn number(&mut self) -> Result<Rational, CurveError> {
        self.rest = self.rest.trim_start();
        let end = self.rest.find([',', ')']).unwrap_or(self.rest.len());
        let (text, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(text.parse()?)
    }

    fn element(&mut self) -> Result<Element, CurveError> {
        if self.peek("Point(") {
            self.eat("Point(")?;
            let time = self.number()?;
            self.eat(",")?;
            let value = self.number()?;
            self.eat(")")?;
            Ok(Point::new(time, value).into())
        } else {
            self.eat("Segment(")?;
            let start = self.number()?;
            self.eat(",")?;
            let end = self.number()?;
            self.eat(",")?;
            let value = self.number()?;
            self.eat(",")?;
            let slope = self.number()?;
            self.eat(")")?;
            Ok(Segment::new(start, end, value, slope).into())
        }
    }

    fn finish(&mut self) -> Result<(), CurveError> {
        if self.rest.trim().is_empty() {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    fn unexpected(&self, expected: &str) -> CurveError {
        let found: String = self.rest.chars().take(16).collect();
        CurveError::Parse(format!("expected `{expected}`, found `{found}`"))
    }
}
