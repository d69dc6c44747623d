//! CLI definitions for autoengage.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use autoengage_core::options::{Coordinates, EngagementThresholds};
use autoengage_core::{InteractionMode, InteractionOptions, StoryOptions};

/// autoengage CLI.
#[derive(Parser)]
#[command(name = "autoengage")]
#[command(about = "Browser-driven social engagement engine")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Engage with posts on a surface (feed, explore, user, #hashtag, location:place)
    Campaign(CampaignArgs),

    /// Walk the story viewer
    Stories(StoriesArgs),

    /// Reply to unanswered inbox threads
    Inbox {
        /// Threads to examine, loaded in batches of 20
        #[arg(long, default_value_t = 20)]
        max: usize,
    },

    /// Print an account's followers
    Followers {
        account: String,

        #[arg(long, default_value_t = 20)]
        max: usize,
    },

    /// Send a fixed message to one or more users
    Dm {
        /// Message text
        #[arg(short, long)]
        message: String,

        /// Recipients
        #[arg(required = true)]
        usernames: Vec<String>,
    },

    /// Validate the configuration file and exit
    Validate,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ModeArg {
    Feed,
    Explore,
    User,
    Hashtag,
    Location,
    CompetitorFollowers,
    Stories,
}

impl From<ModeArg> for InteractionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Feed => InteractionMode::Feed,
            ModeArg::Explore => InteractionMode::Explore,
            ModeArg::User => InteractionMode::User,
            ModeArg::Hashtag => InteractionMode::Hashtag,
            ModeArg::Location => InteractionMode::Location,
            ModeArg::CompetitorFollowers => InteractionMode::CompetitorFollowers,
            ModeArg::Stories => InteractionMode::Stories,
        }
    }
}

#[derive(Args)]
pub(crate) struct CampaignArgs {
    /// Target string; the mode is inferred from its shape when --mode is absent
    pub target: Option<String>,

    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Candidate bound (default 15)
    #[arg(long)]
    pub max_posts: Option<usize>,

    /// Candidate hashtags, one picked at random (repeatable)
    #[arg(long = "hashtag")]
    pub hashtags: Vec<String>,

    /// Pre-resolved location path (<id>/<slug>/)
    #[arg(long)]
    pub location_path: Option<String>,

    /// Place name to resolve
    #[arg(long)]
    pub location_query: Option<String>,

    #[arg(long, requires = "longitude", allow_hyphen_values = true)]
    pub latitude: Option<f64>,

    #[arg(long, requires = "latitude", allow_hyphen_values = true)]
    pub longitude: Option<f64>,

    #[arg(long)]
    pub min_likes: Option<u64>,

    #[arg(long)]
    pub min_comments: Option<u64>,

    /// Accept captions in any language
    #[arg(long)]
    pub any_language: bool,

    /// Accept video posts
    #[arg(long)]
    pub allow_videos: bool,

    /// Accept posts without a caption
    #[arg(long)]
    pub allow_no_caption: bool,

    /// Inspect and classify each author's profile
    #[arg(long)]
    pub inspect_profile: bool,

    /// DM qualifying restaurant profiles
    #[arg(long)]
    pub send_dms: bool,

    #[arg(long)]
    pub max_dms: Option<u32>,

    /// Bio keyword a lead must mention (repeatable)
    #[arg(long = "bio-keyword")]
    pub bio_keywords: Vec<String>,

    /// Followers to visit in competitor_followers mode
    #[arg(long)]
    pub followers: Option<usize>,

    #[arg(long)]
    pub posts_per_follower: Option<usize>,

    /// JSON file with InteractionOptions; flags given on the command line win
    #[arg(long)]
    pub options_file: Option<PathBuf>,

    #[command(flatten)]
    pub stories: StoryArgs,
}

impl CampaignArgs {
    /// Overlay explicit flags on `base`.
    pub fn apply(&self, mut base: InteractionOptions) -> InteractionOptions {
        if let Some(mode) = self.mode {
            base.mode = Some(mode.into());
        }
        if !self.hashtags.is_empty() {
            base.hashtags = self.hashtags.clone();
        }
        if self.location_path.is_some() {
            base.location_path = self.location_path.clone();
        }
        if self.location_query.is_some() {
            base.location_query = self.location_query.clone();
        }
        if let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) {
            base.location_coordinates = Some(Coordinates {
                latitude,
                longitude,
            });
        }
        if self.min_likes.is_some() || self.min_comments.is_some() {
            base.engagement = EngagementThresholds {
                min_likes: self.min_likes.or(base.engagement.min_likes),
                min_comments: self.min_comments.or(base.engagement.min_comments),
            };
        }
        if self.any_language {
            base.english_only = false;
        }
        if self.allow_videos {
            base.images_only = false;
        }
        if self.allow_no_caption {
            base.require_caption = false;
        }
        base.inspect_profile |= self.inspect_profile;
        base.send_dms |= self.send_dms;
        if self.max_dms.is_some() {
            base.max_outbound_dms = self.max_dms;
        }
        if !self.bio_keywords.is_empty() {
            base.required_bio_keywords = self.bio_keywords.clone();
        }
        if self.followers.is_some() {
            base.followers_to_engage = self.followers;
        }
        if self.posts_per_follower.is_some() {
            base.posts_per_follower = self.posts_per_follower;
        }
        base.stories = self.stories.apply(base.stories);
        base
    }
}

#[derive(Args)]
pub(crate) struct StoryArgs {
    /// Stories to watch
    #[arg(long)]
    pub count: Option<usize>,

    #[arg(long)]
    pub min_watch_ms: Option<u64>,

    #[arg(long)]
    pub max_watch_ms: Option<u64>,

    #[arg(long)]
    pub like_probability: Option<f64>,

    #[arg(long)]
    pub reaction_probability: Option<f64>,

    /// Reply text sent as a reaction (default 🔥)
    #[arg(long)]
    pub reaction: Option<String>,
}

impl StoryArgs {
    pub fn apply(&self, mut base: StoryOptions) -> StoryOptions {
        base.count = self.count.or(base.count);
        base.min_watch_ms = self.min_watch_ms.or(base.min_watch_ms);
        base.max_watch_ms = self.max_watch_ms.or(base.max_watch_ms);
        base.like_probability = self.like_probability.or(base.like_probability);
        base.reaction_probability = self.reaction_probability.or(base.reaction_probability);
        base.reaction_text = self.reaction.clone().or(base.reaction_text);
        base
    }
}

#[derive(Args)]
pub(crate) struct StoriesArgs {
    /// Account whose stories to watch; the home tray when absent
    pub username: Option<String>,

    #[command(flatten)]
    pub story: StoryArgs,
}
