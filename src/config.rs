use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{ensure, Context as _};
use clap::{Args, ValueEnum};
use serde::Deserialize;

use crate::{
    algorithm::scoring::TScore,
    engine::{Aligner, EngineChoice, EngineSettings},
    render::RenderMode,
    size::SizePolicy,
    worker::WorkerSettings,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One `<div class="diff-line">` per line.
    Html,
    /// A standalone HTML page with the default stylesheet.
    Document,
    /// Both texts side by side, padded to a common length.
    Aligned,
    /// The aligned lines as JSON.
    Json,
    /// Line counts and the size classification.
    Stats,
}

macro_rules! config_structs {
    {
        $(
            $( #[config_opt($attr:meta)] )*
            pub $name:ident: $typ:ty,
        )*
        $(
            #[config_alias($atarget:ident = $avalue:expr)]
            $( #[config_opt($aattr:meta)] )*
            pub $aname:ident: bool,
        )*
    } => {
        #[derive(Clone, Debug, PartialEq)]
        pub struct Config {
            $( pub $name: $typ, )*
        }

        #[derive(Args, Deserialize, Default, Debug)]
        #[serde(rename_all = "kebab-case", deny_unknown_fields)]
        pub struct ConfigOpt {
            $( $( #[$aattr] )* #[serde(skip)] pub $aname: bool, )*
            $( $( #[$attr] )* pub $name: Option<$typ>, )*
        }

        impl Config {
            pub fn update(self, mut opt: ConfigOpt) -> Config {
                $(
                    if opt.$aname {
                        opt.$atarget = Some($avalue);
                    }
                )*
                Config {
                    $( $name: opt.$name.unwrap_or(self.$name), )*
                }
            }
        }
    }
}

config_structs! {
    #[config_opt(arg(short, long, group = "mode_group"))]
    pub mode: RenderMode,

    #[config_opt(arg(short, long))]
    pub output: OutputFormat,

    #[config_opt(arg(short, long))]
    pub engine: EngineChoice,

    #[config_opt(arg(long, value_name = "SCORE"))]
    pub smart_threshold: TScore,

    #[config_opt(arg(long, value_name = "SCORE"))]
    pub basic_threshold: TScore,

    #[config_opt(arg(skip))]
    pub tiers: SizePolicy,

    #[config_opt(arg(long, value_name = "SECONDS"))]
    pub full_timeout: u64,

    #[config_opt(arg(long, value_name = "SECONDS"))]
    pub paged_timeout: u64,

    #[config_opt(arg(long, value_name = "SECONDS"))]
    pub streaming_timeout: u64,

    #[config_opt(arg(long, value_name = "NUM"))]
    pub lines_per_page: usize,

    #[config_opt(arg(long, value_name = "CHARS"))]
    pub stream_threshold: usize,

    #[config_opt(arg(long, value_name = "NUM"))]
    pub stream_chunk_lines: usize,

    #[config_opt(arg(long, value_name = "NUM"))]
    pub partial_threshold: usize,

    #[config_opt(arg(long, value_name = "NUM"))]
    pub partial_batch_size: usize,

    #[config_opt(arg(long, value_name = "NUM"))]
    pub cache_capacity: usize,

    #[config_opt(arg(long, require_equals = true, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", group = "debug_validate_group"))]
    pub debug_validate: bool,

    #[config_alias(mode = RenderMode::Inline)]
    #[config_opt(arg(long, group = "mode_group"))]
    pub inline: bool,

    #[config_alias(debug_validate = false)]
    #[config_opt(arg(long, group = "debug_validate_group"))]
    pub no_debug_validate: bool,
}

impl Default for Config {
    fn default() -> Config {
        let engine = EngineSettings::default();
        let worker = engine.worker;
        Config {
            mode: RenderMode::Line,
            output: OutputFormat::Html,
            engine: EngineChoice::Auto,
            smart_threshold: engine.aligner.smart_threshold,
            basic_threshold: engine.aligner.basic_threshold,
            tiers: engine.aligner.policy,
            full_timeout: worker.full_timeout.as_secs(),
            paged_timeout: worker.paged_timeout.as_secs(),
            streaming_timeout: worker.streaming_timeout.as_secs(),
            lines_per_page: engine.lines_per_page,
            stream_threshold: worker.stream_threshold_chars,
            stream_chunk_lines: worker.stream_chunk_lines,
            partial_threshold: worker.partial_threshold_lines,
            partial_batch_size: worker.partial_batch_chunks,
            cache_capacity: engine.cache_capacity,
            debug_validate: false,
        }
    }
}

/// `$XDG_CONFIG_HOME/notediff/config.toml` or the platform's equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("notediff").join("config.toml"))
}

impl ConfigOpt {
    pub fn from_toml(text: &str) -> Result<ConfigOpt, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads a config file. A missing file is not an error.
    pub fn read_file(path: &Path) -> anyhow::Result<Option<ConfigOpt>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("cannot read {}", path.display())),
        };
        let opt = ConfigOpt::from_toml(&text).with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(Some(opt))
    }
}

impl Config {
    /// Defaults, overridden by the config file (if there is one), overridden by `cli`.
    pub fn load(cli: ConfigOpt, file: Option<&Path>) -> anyhow::Result<Config> {
        let mut config = Config::default();
        if let Some(opt) = file.map(ConfigOpt::read_file).transpose()?.flatten() {
            config = config.update(opt);
        }
        let config = config.update(cli);
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> anyhow::Result<()> {
        for (name, threshold) in [("smart", self.smart_threshold), ("basic", self.basic_threshold)] {
            ensure!(
                (0.0..=1.0).contains(&threshold),
                "{name} threshold must be between 0 and 1, got {threshold}"
            );
        }
        ensure!(self.lines_per_page > 0, "lines per page must be positive");
        let tiers = &self.tiers;
        ensure!(
            tiers.small.max_lines <= tiers.medium.max_lines && tiers.medium.max_lines <= tiers.large.max_lines,
            "tier line limits must not decrease"
        );
        ensure!(
            tiers.small.max_chars <= tiers.medium.max_chars && tiers.medium.max_chars <= tiers.large.max_chars,
            "tier char limits must not decrease"
        );
        Ok(())
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            full_timeout: Duration::from_secs(self.full_timeout),
            paged_timeout: Duration::from_secs(self.paged_timeout),
            streaming_timeout: Duration::from_secs(self.streaming_timeout),
            partial_threshold_lines: self.partial_threshold,
            partial_batch_chunks: self.partial_batch_size,
            stream_threshold_chars: self.stream_threshold,
            stream_chunk_lines: self.stream_chunk_lines,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            choice: self.engine,
            aligner: Aligner {
                policy: self.tiers.clone(),
                smart_threshold: self.smart_threshold,
                basic_threshold: self.basic_threshold,
            },
            worker: self.worker_settings(),
            lines_per_page: self.lines_per_page,
            cache_capacity: self.cache_capacity,
        }
    }
}
