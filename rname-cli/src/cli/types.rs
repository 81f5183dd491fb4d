use clap::ValueEnum;
use rname_core::SortMode;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

impl From<OutputFormat> for rname_core::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Summary => Self::Summary,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// `--sort` value parser; `none` disables sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortArg(pub Option<SortMode>);

pub fn parse_sort(s: &str) -> Result<SortArg, String> {
    SortMode::parse_optional(s).map(SortArg)
}
