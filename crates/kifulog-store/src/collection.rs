//! Named store partitions.

use std::fmt;

/// A named partition of the store.
///
/// Collections are independent namespaces: the same id may appear in two
/// collections with unrelated meaning. The value schema is fixed per
/// collection, but the store never looks inside values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Game records (`kifu.Kifu`).
    Kifu,
    /// Board positions (`kifu.Board`).
    Board,
    /// User accounts (`account.Account`).
    Account,
    /// Login sessions (`account.Session`), referencing an account id.
    Session,
    /// Comments on boards (`kifu.Comment`).
    Comment,
    /// Per-record upload metadata (`kifu.Metadata`).
    KifuMeta,
}

impl Collection {
    /// Every collection, in load order.
    pub const ALL: [Collection; 6] = [
        Collection::Kifu,
        Collection::Board,
        Collection::Account,
        Collection::Session,
        Collection::Comment,
        Collection::KifuMeta,
    ];

    /// Name of the backing file under the store root.
    pub fn file_name(self) -> &'static str {
        match self {
            Collection::Kifu => "kifu",
            Collection::Board => "board",
            Collection::Account => "account",
            Collection::Session => "session",
            Collection::Comment => "comment",
            Collection::KifuMeta => "kifu_meta",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}
