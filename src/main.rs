use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use coursekit::{AuthUser, ClientConfig, HttpBackend, Session};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;
use url::Url;

mod format;
mod sync;

/// Works against a course platform backend from the terminal.
#[derive(Parser)]
#[clap(name = "coursekit", version)]
struct Coursekit {
    /// Base URL of the REST backend
    #[clap(long, env = "API_URL", value_parser, global = true)]
    api_url: Option<Url>,

    /// Bearer token sent with every request
    #[clap(long, env = "API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// Request timeout in seconds
    #[clap(long, env = "API_TIMEOUT", value_parser, global = true)]
    timeout: Option<u64>,

    /// Role the listing views are rendered for (2 = instructor)
    #[clap(long, env = "ROLE_ID", value_parser, default_value_t = coursekit::session::INSTRUCTOR_ROLE_ID, global = true)]
    role_id: i64,

    /// Log at debug level unless RUST_LOG says otherwise
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pull, push or reformat curriculum drafts
    Curriculum {
        #[clap(subcommand)]
        command: CurriculumCommand,
    },
    /// Create or update whole courses
    Course {
        #[clap(subcommand)]
        command: CourseCommand,
    },
    /// Print a course-scoped list as JSON
    List {
        #[clap(short, long, value_enum)]
        kind: ListKind,

        #[clap(short, long, value_parser)]
        course_id: i64,
    },
    /// Upload a file and print its public URL
    Upload {
        #[clap(short, long, value_parser, value_name = "PATH")]
        file: PathBuf,

        #[clap(long, value_parser)]
        folder: String,
    },
}

#[derive(Subcommand)]
pub enum CurriculumCommand {
    Pull {
        #[clap(short, long, value_parser)]
        course_id: i64,

        #[clap(short, long, value_parser, value_name = "PATH")]
        out: PathBuf,
    },
    Push {
        #[clap(short, long, value_parser)]
        course_id: i64,

        #[clap(short, long, value_parser, value_name = "PATH")]
        file: PathBuf,
    },
    Format {
        #[clap(short, long, value_parser, value_name = "PATH")]
        data_path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum CourseCommand {
    Save {
        #[clap(short, long, value_parser, value_name = "PATH")]
        file: PathBuf,

        /// Update this course instead of creating a new one
        #[clap(short, long, value_parser)]
        course_id: Option<i64>,

        /// Print the course page path after saving
        #[clap(long)]
        preview: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ListKind {
    Assignments,
    Quizzes,
    Documents,
    Videos,
    LiveClasses,
    Discussions,
    Ratings,
}

impl Coursekit {
    fn backend(&self) -> Result<HttpBackend> {
        let api_url = self
            .api_url
            .clone()
            .context("API_URL is not set; pass --api-url or set it in the environment")?;

        let mut config = ClientConfig::new(api_url);
        if let Some(token) = &self.api_token {
            config = config.with_token(SecretString::new(token.clone()));
        }
        if let Some(seconds) = self.timeout {
            config = config.with_timeout(Duration::from_secs(seconds));
        }

        Ok(HttpBackend::new(config)?)
    }

    fn session(&self) -> Session {
        Session::new(AuthUser {
            id: 0,
            name: "coursekit".to_owned(),
            email: None,
            role_id: self.role_id,
            is_admin: false,
        })
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(feature = "env-file")]
    dotenvy::dotenv().ok();

    let coursekit = Coursekit::parse();
    init_tracing(coursekit.verbose);

    match &coursekit.command {
        Command::Curriculum {
            command: CurriculumCommand::Format { data_path },
        } => format::format(data_path.clone()),
        Command::Curriculum { command } => sync::curriculum(&coursekit.backend()?, command).await,
        Command::Course { command } => sync::course(coursekit.backend()?, command).await,
        Command::List { kind, course_id } => {
            sync::list(&coursekit.backend()?, &coursekit.session(), *kind, *course_id).await
        }
        Command::Upload { file, folder } => sync::upload(&coursekit.backend()?, file, folder).await,
    }
}
