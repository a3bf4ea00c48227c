use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use vista_views::ViewKind;

#[derive(Parser)]
#[command(name = "vista")]
#[command(about = "Inspect project view snapshots", long_about = None)]
#[command(version, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Materialize a view from a captured snapshot message
    Render(RenderArgs),
    /// List the field catalog of a snapshot
    Fields(FieldsArgs),
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
pub struct RenderArgs {
    /// Path to a captured `fields` message (JSON)
    pub snapshot: PathBuf,

    /// View key to render; defaults to the snapshot's own key
    #[arg(long)]
    pub view_key: Option<String>,

    /// View kind
    #[arg(long, value_enum, default_value_t = KindArg::Table)]
    pub kind: KindArg,

    /// Sort override: FIELD or FIELD:asc / FIELD:desc
    #[arg(long)]
    pub sort: Option<String>,

    /// Grouping override (field id or name)
    #[arg(long)]
    pub group_by: Option<String>,

    /// Slice override: FIELD=VALUE, or bare FIELD for "no value"
    #[arg(long)]
    pub slice: Option<String>,

    /// Hide a field (repeatable)
    #[arg(long = "hide", value_name = "FIELD")]
    pub hidden: Vec<String>,

    /// Sum a numeric field in group headers (repeatable)
    #[arg(long = "divisor", value_name = "FIELD")]
    pub divisors: Vec<String>,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct FieldsArgs {
    /// Path to a captured `fields` message (JSON)
    pub snapshot: PathBuf,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Table,
    Board,
    Roadmap,
}

impl From<KindArg> for ViewKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Table => ViewKind::Table,
            KindArg::Board => ViewKind::Board,
            KindArg::Roadmap => ViewKind::Roadmap,
        }
    }
}
