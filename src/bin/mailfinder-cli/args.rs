use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
#[cfg(not(feature = "with-serde"))]
use anyhow::bail;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use mailfinder_lib::FinderOptions;

#[derive(Parser)]
#[command(name = "mailfinder-cli", version)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,

    /// format de sortie
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// fichier de configuration TOML (feature `with-serde`)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// verbosité des logs sur stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Réglages SMTP/DNS communs à toutes les sous-commandes. Ils priment sur
/// le fichier de configuration.
#[derive(Args)]
pub struct ProbeArgs {
    /// nom utilisé pour HELO (par défaut le domaine testé)
    #[arg(long, global = true)]
    pub helo: Option<String>,

    /// enveloppe MAIL FROM (par défaut verify@domaine)
    #[arg(long = "from", global = true)]
    pub mail_from: Option<String>,

    /// timeout par opération réseau (ms)
    #[arg(long = "timeout-ms", global = true)]
    pub timeout_ms: Option<u64>,

    /// port SMTP
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// serveur DNS à utiliser (répétable, sinon configuration système)
    #[arg(long = "dns-server", global = true)]
    pub dns_servers: Vec<IpAddr>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// cherche l'adresse d'une personne en sondant les permutations
    Find {
        #[command(flatten)]
        person: PersonArgs,
        /// hôte MX déjà connu (saute la résolution)
        #[arg(long)]
        mx: Option<String>,
        /// pause entre deux sondages (ms)
        #[arg(long = "delay-ms")]
        delay_ms: Option<u64>,
        /// n'effectue pas la détection catch-all
        #[arg(long = "no-catch-all")]
        no_catch_all: bool,
    },
    /// sonde une adresse unique
    Probe {
        email: String,
        /// hôte MX déjà connu (saute la résolution)
        #[arg(long)]
        mx: Option<String>,
    },
    /// teste si le domaine accepte n'importe quel destinataire
    CatchAll {
        domain: String,
        /// hôte MX déjà connu (saute la résolution)
        #[arg(long)]
        mx: Option<String>,
    },
    /// liste les enregistrements MX du domaine
    Mx { domain: String },
    /// affiche les permutations candidates sans rien sonder
    Candidates {
        #[command(flatten)]
        person: PersonArgs,
    },
}

#[derive(Args)]
pub struct PersonArgs {
    /// prénom
    #[arg(long)]
    pub first: String,
    /// nom de famille (peut être composé)
    #[arg(long)]
    pub last: Option<String>,
    /// domaine de l'entreprise
    #[arg(long)]
    pub domain: String,
    /// nombre maximum de candidats
    #[arg(long = "max-candidates")]
    pub max_candidates: Option<usize>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Defaults, then the config file, then explicit flags.
    pub fn finder_options(&self) -> Result<FinderOptions> {
        let mut options = load_config(self.config.as_deref())?;
        self.probe.apply(&mut options);

        match &self.cmd {
            Commands::Find {
                person,
                delay_ms,
                no_catch_all,
                ..
            } => {
                person.apply(&mut options);
                if let Some(ms) = delay_ms {
                    options.probe_delay = Duration::from_millis(*ms);
                }
                if *no_catch_all {
                    options.catch_all_check = false;
                }
            }
            Commands::Candidates { person } => person.apply(&mut options),
            Commands::Probe { .. } | Commands::CatchAll { .. } | Commands::Mx { .. } => {}
        }
        Ok(options)
    }
}

impl ProbeArgs {
    fn apply(&self, options: &mut FinderOptions) {
        if let Some(helo) = &self.helo {
            options.probe.helo_domain = Some(helo.clone());
        }
        if let Some(from) = &self.mail_from {
            options.probe.envelope_sender = Some(from.clone());
        }
        if let Some(ms) = self.timeout_ms {
            let timeout = Duration::from_millis(ms);
            options.probe.connect_timeout = timeout;
            options.probe.command_timeout = timeout;
            options.dns.timeout = timeout;
        }
        if let Some(port) = self.port {
            options.probe.port = port;
        }
        if !self.dns_servers.is_empty() {
            options.dns.servers = self.dns_servers.clone();
        }
    }
}

impl PersonArgs {
    fn apply(&self, options: &mut FinderOptions) {
        if let Some(max) = self.max_candidates {
            options.max_candidates = max;
        }
    }
}

#[cfg(feature = "with-serde")]
fn load_config(path: Option<&Path>) -> Result<FinderOptions> {
    use mailfinder_lib::finder::config::ConfigFile;

    match path {
        Some(path) => Ok(ConfigFile::load(path)?.into_options()),
        None => Ok(FinderOptions::default()),
    }
}

#[cfg(not(feature = "with-serde"))]
fn load_config(path: Option<&Path>) -> Result<FinderOptions> {
    if path.is_some() {
        bail!("--config nécessite la feature 'with-serde'");
    }
    Ok(FinderOptions::default())
}
