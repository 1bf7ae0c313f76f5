//! Clap derive structures for the `dmxnode` CLI.
//!
//! Defines the command tree, global flags and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dmxnode -- watch and configure a networked DMX node
#[derive(Debug, Parser)]
#[command(
    name = "dmxnode",
    version,
    about = "Watch and configure DMX lighting nodes from the command line",
    long_about = "Talks to a DMX node's REST API and live status channel.\n\n\
        `watch` keeps a synchronized view of system, DMX port and network\n\
        state, falling back to polling whenever the push channel is down.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "DMXNODE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device address, e.g. 192.168.4.1 or http://node.local (overrides profile)
    #[arg(long, short = 'a', env = "DMXNODE_ADDRESS", global = true)]
    pub address: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DMXNODE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "DMXNODE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in milliseconds (overrides profile)
    #[arg(long, env = "DMXNODE_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream live device state until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Fetch system, port and network state once
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Inspect and configure DMX output ports
    Port(PortArgs),

    /// Configure Ethernet and Wi-Fi
    #[command(alias = "net")]
    Network(NetworkArgs),

    /// Log in with the admin password and store the session token
    Login,

    /// Forget the stored session token
    Logout,

    /// Change the device admin password
    SetPassword,

    /// Reboot the device
    Reboot,

    /// Erase all settings and restore factory defaults
    FactoryReset,

    /// Download the device configuration file
    Export(ExportArgs),

    /// Upload a configuration file to the device
    Import(ImportArgs),

    /// Upload a firmware image
    Ota(OtaArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch / Status ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Never open the push channel; poll only
    #[arg(long)]
    pub no_push: bool,

    /// Print device events only, not state changes
    #[arg(long)]
    pub events_only: bool,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Only fetch one domain
    #[arg(long, short = 'd', value_enum)]
    pub domain: Option<DomainArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DomainArg {
    System,
    Dmx,
    Network,
}

// ── Port ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PortArgs {
    #[command(subcommand)]
    pub command: PortCommand,
}

#[derive(Debug, Subcommand)]
pub enum PortCommand {
    /// List the DMX output ports
    #[command(alias = "ls")]
    List,

    /// Change one port and save it to the device
    Set(PortSetArgs),
}

#[derive(Debug, Args)]
pub struct PortSetArgs {
    /// Port number (0-3)
    pub port: u8,

    /// Art-Net / sACN universe (1-32768)
    #[arg(long, short = 'u')]
    pub universe: Option<u16>,

    /// Enable output on the port
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    /// Disable output on the port
    #[arg(long)]
    pub disable: bool,

    /// DMX break length in microseconds (88-500)
    #[arg(long)]
    pub break_us: Option<u16>,

    /// Mark-after-break length in microseconds (8-100)
    #[arg(long)]
    pub mab_us: Option<u16>,
}

// ── Network ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NetworkArgs {
    #[command(subcommand)]
    pub command: NetworkCommand,
}

#[derive(Debug, Subcommand)]
pub enum NetworkCommand {
    /// Show link state and addresses
    Show,

    /// Save network settings (applied on the next reboot)
    Set(NetworkSetArgs),
}

#[derive(Debug, Args)]
pub struct NetworkSetArgs {
    /// Read the full network config from a JSON file
    #[arg(
        long,
        short = 'F',
        conflicts_with_all = ["dhcp", "static_ip", "wifi_ssid", "ap_ssid"]
    )]
    pub from_file: Option<PathBuf>,

    /// Use DHCP on Ethernet
    #[arg(long, conflicts_with = "static_ip")]
    pub dhcp: bool,

    /// Static Ethernet address
    #[arg(long, requires = "netmask")]
    pub static_ip: Option<String>,

    /// Static Ethernet netmask
    #[arg(long, requires = "static_ip")]
    pub netmask: Option<String>,

    /// Static Ethernet gateway
    #[arg(long, requires = "static_ip")]
    pub gateway: Option<String>,

    /// Join this Wi-Fi network (password is prompted for)
    #[arg(long)]
    pub wifi_ssid: Option<String>,

    /// Run an access point with this SSID
    #[arg(long)]
    pub ap_ssid: Option<String>,

    /// Access point channel (1-11)
    #[arg(long, requires = "ap_ssid")]
    pub ap_channel: Option<u8>,

    /// Leave the access point open (no password prompt)
    #[arg(long, requires = "ap_ssid")]
    pub ap_open: bool,
}

// ── Files & firmware ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Configuration file previously produced by `export`
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct OtaArgs {
    /// Firmware image (.bin)
    pub image: PathBuf,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Display the resolved configuration
    Show,

    /// Set a profile value (e.g. `address`, `push`, `poll.dmx_ms`)
    Set {
        /// Key to set
        key: String,
        /// Value
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
