use std::fmt;

use crate::QueryValue;

#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    And(Box<Where>, Box<Where>),
    Eq(Box<Where>, Box<Where>),
    IsNull(Box<Where>),
    Value(QueryValue),
}

impl Where {
    /// Join conditions with `AND`, `None` for an empty list
    pub fn all<I>(conds: I) -> Option<Where>
    where
        I: IntoIterator<Item = Where>,
    {
        conds.into_iter().fold(None, |acc, c| match acc {
            Some(acc) => Some(Where::And(Box::new(acc), Box::new(c))),
            None => Some(c),
        })
    }
}

impl<T: Into<QueryValue>> From<T> for Where {
    fn from(v: T) -> Self {
        Self::Value(v.into())
    }
}

impl fmt::Display for Where {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            Self::And(l, r) => write!(f, "({} AND {})", l, r),
            Self::Eq(l, r) => write!(f, "({} = {})", l, r),
            Self::IsNull(v) => write!(f, "({} IS NULL)", v),
            Self::Value(v) => write!(f, "{}", v),
        }
    }
}

#[macro_export]
macro_rules! and {
    ($left:expr, $right:expr) => {
        $crate::Where::And(
            Box::new($crate::literal!($left)),
            Box::new($crate::literal!($right)),
        )
    };
}

#[macro_export]
macro_rules! literal {
    ($lit:expr) => {
        $crate::Where::from($lit)
    };
}

#[macro_export]
macro_rules! eq {
    ($left:expr, $right:expr) => {
        $crate::Where::Eq(
            Box::new($crate::literal!($left)),
            Box::new($crate::literal!($right)),
        )
    };
}

#[macro_export]
macro_rules! is_null {
    ($expr:expr) => {
        $crate::Where::IsNull(Box::new($crate::literal!($expr)))
    };
}

#[cfg(test)]
mod test {
    use crate::*;

    #[test]
    fn test1() {
        assert_eq!(&and!(1, 2).to_string(), "(1 AND 2)");

        assert_eq!(&eq!("a", 1).to_string(), "(a = 1)");

        assert_eq!(&eq!("a", sql_str("abc")).to_string(), "(a = 'abc')");

        assert_eq!(&eq!("a", sql_str("it's")).to_string(), "(a = 'it''s')");

        assert_eq!(&eq!("a", param()).to_string(), "(a = ?)");

        assert_eq!(&eq!(eq!(1, 2), true).to_string(), "((1 = 2) = true)");

        assert_eq!(&is_null!("deleted_at").to_string(), "(deleted_at IS NULL)");
    }

    #[test]
    fn test_all() {
        assert_eq!(Where::all(vec![]), None);

        let cond = Where::all(vec![eq!("a", param()), is_null!("b"), eq!("c", 3)]).unwrap();
        assert_eq!(&cond.to_string(), "(((a = ?) AND (b IS NULL)) AND (c = 3))");
    }
}
