use serde::{
    de::{Deserializer, Error as DeError, Unexpected, Visitor},
    Deserialize, Serialize,
};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    marker::PhantomData,
};

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct GroupId(pub u64);

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct RoleId(pub u64);

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct UserId(pub u64);

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl Display for RoleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl From<u64> for GroupId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u64> for RoleId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Roblox ids show up both as JSON numbers and as strings (the dashboard sends
/// whatever it got from the query string), so accept either.
struct IdVisitor<V> {
    _p: PhantomData<V>,
}

impl<'de, V> Visitor<'de> for IdVisitor<V>
where
    V: From<u64>,
{
    type Value = V;

    fn expecting(&self, f: &mut Formatter) -> FmtResult {
        f.write_str("a roblox id")
    }

    fn visit_u64<E: DeError>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Self::Value::from(v))
    }

    fn visit_i64<E: DeError>(self, v: i64) -> Result<Self::Value, E> {
        let val = u64::try_from(v)
            .map_err(|_| DeError::invalid_value(Unexpected::Signed(v), &"a positive id"))?;
        self.visit_u64(val)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(IdVisitor { _p: PhantomData })
    }

    fn visit_str<E: DeError>(self, v: &str) -> Result<Self::Value, E> {
        let value = v.parse().map_err(|_| {
            let unexpected = Unexpected::Str(v);
            DeError::invalid_value(unexpected, &"a u64 string")
        })?;

        self.visit_u64(value)
    }
}

impl<'de> Deserialize<'de> for GroupId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor { _p: PhantomData })
    }
}

impl<'de> Deserialize<'de> for RoleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor { _p: PhantomData })
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor { _p: PhantomData })
    }
}
