use clap::{Args, Subcommand};
use model::core::location::DEFAULT_BUCKET_TYPE;

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a single object
    Fetch {
        #[command(flatten)]
        bucket: BucketArgs,

        #[arg(long, help = "Object key")]
        key: String,
    },
    /// Run a secondary index query and stream the matching keys
    IndexQuery {
        #[command(flatten)]
        bucket: BucketArgs,

        #[arg(long, help = "Index name, e.g. age_int, email_bin, $key")]
        index: String,

        #[arg(
            long = "match",
            conflicts_with_all = ["start", "end"],
            help = "Exact index term to match"
        )]
        match_term: Option<String>,

        #[arg(long, requires = "end", help = "Inclusive start of the term range")]
        start: Option<String>,

        #[arg(long, requires = "start", help = "Inclusive end of the term range")]
        end: Option<String>,

        #[arg(long, help = "Stop after this many results and print a continuation")]
        max_results: Option<usize>,

        #[arg(long, help = "Hex continuation printed by a previous page")]
        continuation: Option<String>,

        #[arg(long, help = "Include the matching index term with each key")]
        return_terms: bool,
    },
    /// Stream every key in a bucket
    ListKeys {
        #[command(flatten)]
        bucket: BucketArgs,
    },
}

#[derive(Args)]
pub struct BucketArgs {
    #[arg(long, help = "Bucket name")]
    pub bucket: String,

    #[arg(long, default_value = DEFAULT_BUCKET_TYPE, help = "Bucket type")]
    pub bucket_type: String,
}
