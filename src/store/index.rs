/// Key kind of one indexed field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKey {
    Ascending,
    Descending,
    Geo2dSphere,
}

impl IndexKey {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Ascending => "1",
            Self::Descending => "-1",
            Self::Geo2dSphere => "2dsphere",
        }
    }
}

/// Index declaration handed to the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub keys: Vec<(String, IndexKey)>,
    pub unique: bool,
}

impl IndexSpec {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = (K, IndexKey)>,
        K: Into<String>,
    {
        Self { keys: keys.into_iter().map(|(k, kind)| (k.into(), kind)).collect(), unique: false }
    }

    pub fn unique(field: impl Into<String>) -> Self {
        Self { keys: vec![(field.into(), IndexKey::Ascending)], unique: true }
    }

    /// Conventional name, e.g. `price_1_ratingsAverage_-1`.
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, kind)| format!("{field}_{}", kind.suffix()))
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(field, _)| field.as_str())
    }
}
