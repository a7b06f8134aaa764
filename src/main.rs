//! CLI entry point for `rfc822`, an inspection tool for single messages.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};

use rfc822_model::charset::encoded_word::decode_mime_encoded_words;
use rfc822_model::config::{self, Config};
use rfc822_model::{
    Address, AddressField, Charset, CharsetAliases, ConvertOptions, Message, TextEncoding,
};

#[derive(Parser)]
#[command(
    name = "rfc822",
    version,
    about = "Inspect RFC 822 / MIME messages",
    long_about = "Inspect RFC 822 / MIME messages: decoded headers, MIME structure, \
                  body text of any part and address fields."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print header fields with encoded words decoded
    Headers {
        /// Message file, or `-` for stdin
        path: PathBuf,
        /// Charset to decode into
        #[arg(long, default_value = "utf-8")]
        charset: String,
    },
    /// Show the MIME tree
    Structure {
        /// Message file, or `-` for stdin
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the decoded body of a part
    Body {
        /// Message file, or `-` for stdin
        path: PathBuf,
        /// Dotted part path, e.g. `1.2` (default: the message itself)
        #[arg(short, long)]
        part: Option<String>,
        /// Charset to interpret the body under (default: its declared charset)
        #[arg(long)]
        charset: Option<String>,
    },
    /// List address fields
    Addresses {
        /// Message file, or `-` for stdin
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show or initialize the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Headers { path, charset } => cmd_headers(&path, &charset, &config),
        Commands::Structure { path, json } => cmd_structure(&path, json, &config),
        Commands::Body {
            path,
            part,
            charset,
        } => cmd_body(&path, part.as_deref(), charset.as_deref(), &config),
        Commands::Addresses { path, json } => cmd_addresses(&path, json, &config),
        Commands::Config { init } => cmd_config(init, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "rfc822.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Read a message from a file (or stdin for `-`) using the configured aliases.
fn read_message(path: &Path, config: &Config) -> anyhow::Result<Message> {
    let mut raw = Vec::new();
    if path == Path::new("-") {
        std::io::stdin().read_to_end(&mut raw)?;
    } else {
        if !path.exists() {
            anyhow::bail!("File not found: {}", path.display());
        }
        raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    }
    tracing::info!(path = %path.display(), bytes = raw.len(), "Read message");
    Ok(Message::with_charset_aliases(
        raw,
        config.charset.build_aliases(),
    ))
}

/// Decode encoded words in a header fragment into printable UTF-8.
fn decode_for_display(bytes: &[u8], aliases: &CharsetAliases) -> String {
    match decode_mime_encoded_words(
        bytes,
        Some(Charset::Resolved(TextEncoding::UTF_8)),
        aliases,
        &ConvertOptions::lossy(),
    ) {
        Ok(text) => text.to_str().into_owned(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not decode header text");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

fn cmd_headers(path: &Path, charset: &str, config: &Config) -> anyhow::Result<()> {
    let msg = read_message(path, config)?;
    let options = ConvertOptions::lossy();

    let mut out = std::io::stdout().lock();
    for (name, value) in msg.header().iter() {
        let text = decode_mime_encoded_words(
            value,
            Some(Charset::from(charset)),
            msg.charset_aliases(),
            &options,
        )?;
        out.write_all(name)?;
        out.write_all(b": ")?;
        out.write_all(text.as_bytes())?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Walk a dotted part path (`1.2`), stepping through embedded messages.
fn select_part<'a>(msg: &'a Message, part: &str) -> anyhow::Result<&'a Message> {
    let mut current = msg;
    for segment in part.split('.').filter(|s| !s.is_empty()) {
        let index: usize = segment
            .parse()
            .with_context(|| format!("invalid part number '{segment}'"))?;
        while let Some(inner) = current.message() {
            current = inner;
        }
        let parts = current
            .parts()
            .ok_or_else(|| anyhow::anyhow!("part {part}: not a multipart message"))?;
        current = index
            .checked_sub(1)
            .and_then(|i| parts.get(i))
            .ok_or_else(|| anyhow::anyhow!("part {part}: no part {segment}"))?;
    }
    Ok(current)
}

fn cmd_structure(path: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let msg = read_message(path, config)?;
    if json {
        let tree = structure_json(&msg, "");
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        println!();
        print_structure(&msg, "", 0);
        println!();
    }
    Ok(())
}

fn child_path(parent: &str, index: usize) -> String {
    if parent.is_empty() {
        index.to_string()
    } else {
        format!("{parent}.{index}")
    }
}

fn print_structure(msg: &Message, path: &str, depth: usize) {
    use humansize::{format_size, BINARY};

    let label = if path.is_empty() { "-" } else { path };
    let mut line = format!(
        "  {}{:<8} {:<40} {:>10}",
        "  ".repeat(depth),
        label,
        String::from_utf8_lossy(&msg.content_type()),
        format_size(msg.body().raw_source().len(), BINARY)
    );
    if let Some(disposition) = msg.content_disposition() {
        line.push_str(&format!("  {}", String::from_utf8_lossy(disposition)));
    }
    if let Some(filename) = msg.content_disposition_parameter("filename") {
        line.push_str(&format!(" \"{}\"", decode_for_display(filename, msg.charset_aliases())));
    }
    println!("{line}");

    if let Some(inner) = msg.message() {
        print_structure(inner, path, depth + 1);
    }
    for (i, part) in msg.parts().unwrap_or_default().iter().enumerate() {
        print_structure(part, &child_path(path, i + 1), depth + 1);
    }
}

fn structure_json(msg: &Message, path: &str) -> serde_json::Value {
    let lossy = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();

    let parts: Vec<serde_json::Value> = msg
        .parts()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, part)| structure_json(part, &child_path(path, i + 1)))
        .collect();

    serde_json::json!({
        "path": path,
        "content_type": lossy(&msg.content_type()),
        "charset": msg.charset().map(lossy),
        "disposition": msg.content_disposition().map(lossy),
        "filename": msg
            .content_disposition_parameter("filename")
            .map(|f| decode_for_display(f, msg.charset_aliases())),
        "subject": msg
            .header()
            .get("subject")
            .map(|s| decode_for_display(s, msg.charset_aliases())),
        "date": msg.date().map(|d| d.to_rfc3339()),
        "size": msg.body().raw_source().len(),
        "message": msg.message().map(|inner| structure_json(inner, path)),
        "parts": parts,
    })
}

fn cmd_body(
    path: &Path,
    part: Option<&str>,
    charset: Option<&str>,
    config: &Config,
) -> anyhow::Result<()> {
    let msg = read_message(path, config)?;
    let target = match part {
        Some(part) => select_part(&msg, part)?,
        None => &msg,
    };

    let text = target.mime_charset_body_text(charset.map(Charset::from))?;
    let mut out = std::io::stdout().lock();
    if text.encoding() == TextEncoding::Binary {
        out.write_all(text.as_bytes())?;
    } else {
        let utf8 = text.encode_to(TextEncoding::UTF_8, &ConvertOptions::lossy())?;
        out.write_all(utf8.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

fn address_json(address: &Address, aliases: &CharsetAliases) -> serde_json::Value {
    let lossy = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
    serde_json::json!({
        "display_name": address.display_name.as_deref().map(|n| decode_for_display(n, aliases)),
        "route": address.route.as_deref().map(lossy),
        "local_part": address.local_part.as_deref().map(lossy),
        "domain": address.domain.as_deref().map(lossy),
        "group_start": address.is_group_start(),
        "group_end": address.is_group_end(),
    })
}

fn cmd_addresses(path: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let msg = read_message(path, config)?;
    let aliases = msg.charset_aliases();

    if json {
        let mut fields = serde_json::Map::new();
        for field in AddressField::ALL {
            if let Some(addresses) = msg.address_field(field) {
                let list: Vec<serde_json::Value> =
                    addresses.iter().map(|a| address_json(a, aliases)).collect();
                fields.insert(field.header_name().to_string(), list.into());
            }
        }
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    println!();
    for field in AddressField::ALL {
        let Some(addresses) = msg.address_field(field) else {
            continue;
        };
        println!("  {field}:");
        for address in addresses {
            match &address.display_name {
                Some(name) if !address.is_group_start() => println!(
                    "    {} <{}>",
                    decode_for_display(name, aliases),
                    String::from_utf8_lossy(&address.addr_spec().unwrap_or_default())
                ),
                _ => println!("    {address}"),
            }
        }
    }
    println!();
    Ok(())
}

fn cmd_config(init: bool, config: &Config) -> anyhow::Result<()> {
    if init {
        let path = config::save_config(&Config::default())?;
        println!("  Wrote default configuration to {}", path.display());
        return Ok(());
    }

    match config::config_file_path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# (no config path)"),
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "rfc822", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
