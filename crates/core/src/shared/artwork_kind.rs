use serde::{Deserialize, Serialize};

/// The two artwork images generated per video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtworkKind {
    /// Full frame background image.
    Fanart,
    /// 2:3 center crop.
    Poster,
}

impl ArtworkKind {
    pub const ALL: &'static [ArtworkKind] = &[ArtworkKind::Fanart, ArtworkKind::Poster];

    pub fn name(self) -> &'static str {
        match self {
            ArtworkKind::Fanart => "fanart",
            ArtworkKind::Poster => "poster",
        }
    }
}

impl std::fmt::Display for ArtworkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How artwork file names are derived from a pointer file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkNaming {
    /// `<stem>-fanart.jpg` / `<stem>-poster.jpg`, several items per folder.
    #[default]
    Suffixed,
    /// `fanart.jpg` / `poster.jpg`, one item per folder.
    Fixed,
}

impl ArtworkNaming {
    pub const ALL: &'static [ArtworkNaming] = &[ArtworkNaming::Suffixed, ArtworkNaming::Fixed];

    /// File name (without extension) for the given pointer stem and kind.
    pub fn file_stem(self, pointer_stem: &str, kind: ArtworkKind) -> String {
        match self {
            ArtworkNaming::Suffixed => format!("{pointer_stem}-{}", kind.name()),
            ArtworkNaming::Fixed => kind.name().to_string(),
        }
    }
}

impl std::fmt::Display for ArtworkNaming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtworkNaming::Suffixed => write!(f, "suffixed"),
            ArtworkNaming::Fixed => write!(f, "fixed"),
        }
    }
}

impl std::str::FromStr for ArtworkNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "suffixed" => Ok(ArtworkNaming::Suffixed),
            "fixed" => Ok(ArtworkNaming::Fixed),
            other => Err(format!(
                "naming must be 'suffixed' or 'fixed', got '{other}'"
            )),
        }
    }
}
