/// ID types for Calmwave entities
///
/// Storage assigns both ids (`id_dev`, `id_playlist`), so they wrap the engine's integer
/// row id instead of generating their own.
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(feature = "sqlx-support")]
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef},
    Decode, Encode, Sqlite, Type,
};

/// User identifier (`desenvolvedores.id_dev`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a storage-assigned id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw row id
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

#[cfg(feature = "sqlx-support")]
impl Type<Sqlite> for UserId {
    fn type_info() -> SqliteTypeInfo {
        <i64 as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <i64 as Type<Sqlite>>::compatible(ty)
    }
}

#[cfg(feature = "sqlx-support")]
impl<'q> Encode<'q, Sqlite> for UserId {
    fn encode_by_ref(
        &self,
        args: &mut Vec<SqliteArgumentValue<'q>>,
    ) -> Result<IsNull, BoxDynError> {
        <i64 as Encode<Sqlite>>::encode_by_ref(&self.0, args)
    }
}

#[cfg(feature = "sqlx-support")]
impl<'r> Decode<'r, Sqlite> for UserId {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        Ok(UserId(<i64 as Decode<Sqlite>>::decode(value)?))
    }
}

/// Playlist identifier (`playlists.id_playlist`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(i64);

impl PlaylistId {
    /// Wrap a storage-assigned id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw row id
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PlaylistId> for i64 {
    fn from(id: PlaylistId) -> Self {
        id.0
    }
}

#[cfg(feature = "sqlx-support")]
impl Type<Sqlite> for PlaylistId {
    fn type_info() -> SqliteTypeInfo {
        <i64 as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <i64 as Type<Sqlite>>::compatible(ty)
    }
}

#[cfg(feature = "sqlx-support")]
impl<'q> Encode<'q, Sqlite> for PlaylistId {
    fn encode_by_ref(
        &self,
        args: &mut Vec<SqliteArgumentValue<'q>>,
    ) -> Result<IsNull, BoxDynError> {
        <i64 as Encode<Sqlite>>::encode_by_ref(&self.0, args)
    }
}

#[cfg(feature = "sqlx-support")]
impl<'r> Decode<'r, Sqlite> for PlaylistId {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        Ok(PlaylistId(<i64 as Decode<Sqlite>>::decode(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_round_trips_raw_value() {
        let id = UserId::new(42);
        assert_eq!(id.get(), 42);
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn playlist_id_display() {
        let id = PlaylistId::new(456);
        assert_eq!(format!("{}", id), "456");
    }

    #[test]
    fn ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&UserId::new(7)).unwrap(), "7");
        let id: PlaylistId = serde_json::from_str("9").unwrap();
        assert_eq!(id, PlaylistId::new(9));
    }
}
