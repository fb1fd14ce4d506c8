use serde::{Deserialize, Serialize};

/// Rating value that stands for "shelved but not rated".
pub const UNRATED: f64 = 0.0;

/// Separator between title and author in a composite item key.
pub const ITEM_KEY_SEPARATOR: &str = "; ";

/// One user's rating of one item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: String,
    pub item_id: String,
    pub rating: f64,
}

impl RatingRecord {
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, rating: f64) -> Self {
        Self { user_id: user_id.into(), item_id: item_id.into(), rating }
    }

    /// False for the "no rating" sentinel, which must never reach the matrix.
    pub fn is_rated(&self) -> bool {
        self.rating != UNRATED
    }
}

/// Drops records carrying the "no rating" sentinel, keeping input order.
pub fn retain_rated<I>(records: I) -> Vec<RatingRecord>
where
    I: IntoIterator<Item = RatingRecord>,
{
    records.into_iter().filter(RatingRecord::is_rated).collect()
}

/// Builds the `"<title>; <author>"` key the ratings export uses for books.
///
/// Inputs are joined as given; trimming or stripping markup is the
/// loader's job.
pub fn compose_item_key(title: &str, author: &str) -> String {
    let mut key = String::with_capacity(title.len() + ITEM_KEY_SEPARATOR.len() + author.len());
    key.push_str(title);
    key.push_str(ITEM_KEY_SEPARATOR);
    key.push_str(author);
    key
}
