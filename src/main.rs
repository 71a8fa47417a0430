//! stepin CLI application.
//!
//! This binary provides a command-line interface for issuing and managing
//! certificates in a root / intermediate / leaf hierarchy.

use clap::{Parser, Subcommand};
use stepin::cert::download::{download, DownloadKind};
use stepin::cert::hierarchy::{chain, parent_candidates};
use stepin::cert::issuer::CertificateIssuer;
use stepin::cert::model::Certificate;
use stepin::cert::profile::{KeyType, Profile};
use stepin::cert::request::IssueRequest;
use stepin::config::Config;
use stepin::error::{Result, StepinError};
use stepin::storage::recovery::{export_json, parse_export};
use stepin::storage::{CertificateStore, FileStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "stepin")]
#[command(about = "stepin: issue root, intermediate and leaf certificates", long_about = None)]
struct Cli {
    /// Certificate database file
    #[arg(long, global = true, env = "STEPIN_DATABASE_FILENAME")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a new certificate
    Create {
        /// Profile: root-ca, intermediate-ca, leaf or self-signed
        profile: String,

        /// Subject common name
        #[arg(long)]
        name: String,

        /// Validity in years (1 to 20)
        #[arg(long, default_value = "1")]
        years: i64,

        /// Key type: EC, OKP or RSA
        #[arg(long, default_value = "EC")]
        key_type: String,

        /// Id of the signing CA (intermediate-ca and leaf only)
        #[arg(long)]
        parent: Option<u64>,

        /// Protect the new private key with a passphrase
        #[arg(long)]
        encrypt: bool,

        /// Print the issued record as JSON
        #[arg(long)]
        json: bool,
    },

    /// List certificates
    List {
        /// Only list certificates that can sign others
        #[arg(long)]
        ca_only: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one certificate
    Show {
        /// Certificate id
        #[arg(long)]
        id: u64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a certificate, private key or chain bundle
    Download {
        /// What to download: crt, key or chain
        kind: String,

        /// Certificate id
        #[arg(long)]
        id: u64,

        /// Output file (default: <name>.<kind> in the current directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the chain of a certificate up to its root
    Chain {
        /// Certificate id
        #[arg(long)]
        id: u64,
    },

    /// Write every record as plain JSON (encrypted keys stay encrypted)
    Export {
        /// Output file
        #[arg(long, default_value = "cert.json")]
        output: PathBuf,
    },

    /// Import the records of a plain JSON export into the database
    Recover {
        /// Export to read
        #[arg(long, default_value = "cert.json")]
        from: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(database) = cli.database {
        config.database_filename = database;
    }

    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(Config::default().log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = config.open_store()?;

    match cli.command {
        Commands::Create {
            profile,
            name,
            years,
            key_type,
            parent,
            encrypt,
            json,
        } => {
            let mut request = IssueRequest::new(&profile, &name, years, &key_type);
            request.parent_ca_id = parent;
            handle_create(store, request, encrypt, json)
        }
        Commands::List { ca_only, json } => handle_list(&store, ca_only, json),
        Commands::Show { id, json } => handle_show(&store, id, json),
        Commands::Download { kind, id, output } => handle_download(&store, &kind, id, output),
        Commands::Chain { id } => handle_chain(&store, id),
        Commands::Export { output } => handle_export(&store, &output),
        Commands::Recover { from } => handle_recover(&store, &from),
    }
}

fn handle_create(store: FileStore, mut request: IssueRequest, encrypt: bool, json: bool) -> Result<()> {
    // Fail fast on input that needs no prompt to reject.
    let profile: Profile = request.profile.parse()?;
    request.key_type.parse::<KeyType>()?;

    if let Some(parent_id) = request.parent_ca_id {
        let parent = store.get_by_id(parent_id)?;
        if parent.key_encrypted() {
            let password = Zeroizing::new(rpassword::prompt_password(format!(
                "Enter password for parent CA '{}' ({}): ",
                parent.name, parent.id
            ))?);
            request.parent_ca_password = Some(password.to_string());
        }
    }

    if encrypt {
        let password = Zeroizing::new(rpassword::prompt_password(
            "Enter password to encrypt the new key: ",
        )?);
        let confirm = Zeroizing::new(rpassword::prompt_password("Confirm password: ")?);
        if *password != *confirm {
            return Err(StepinError::InvalidPasswordError);
        }
        request.pass = Some(password.to_string());
    }

    let issuer = CertificateIssuer::new(store);
    let record = issuer.issue(&request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Issued {} certificate {} for '{}'", profile, record.id, record.name);
        if profile.is_ca() {
            println!("Private key is kept in the database and cannot be downloaded.");
        }
        print!("{}", record.inspection);
    }

    Ok(())
}

fn handle_list(store: &FileStore, ca_only: bool, json: bool) -> Result<()> {
    let certificates = if ca_only {
        parent_candidates(store)?
    } else {
        store.list_all()?
    };

    if json {
        let summaries: Vec<_> = certificates.iter().map(Certificate::summary).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if certificates.is_empty() {
        println!("No certificates found.");
        return Ok(());
    }

    println!(
        "{:<6} {:<16} {:<5} {:<8} {:<10} {:<20} Name",
        "ID", "Profile", "Key", "Parent", "Encrypted", "Created"
    );
    println!("{}", "-".repeat(80));
    for certificate in certificates {
        println!(
            "{:<6} {:<16} {:<5} {:<8} {:<10} {:<20} {}",
            certificate.id,
            certificate.profile,
            certificate.key_type,
            certificate
                .parent_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            if certificate.key_encrypted() { "yes" } else { "no" },
            certificate.created_at.format("%Y-%m-%d %H:%M:%S"),
            certificate.name
        );
    }

    Ok(())
}

fn handle_show(store: &FileStore, id: u64, json: bool) -> Result<()> {
    let certificate = store.get_by_id(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&certificate.view())?);
    } else {
        println!(
            "{} certificate {} '{}' ({})",
            certificate.profile, certificate.id, certificate.name, certificate.key_type
        );
        print!("{}", certificate.inspection);
    }

    Ok(())
}

fn handle_download(store: &FileStore, kind: &str, id: u64, output: Option<PathBuf>) -> Result<()> {
    let kind: DownloadKind = kind.parse()?;
    let file = download(store, id, kind)?;

    let output_path = output.unwrap_or_else(|| PathBuf::from(&file.filename));
    fs::write(&output_path, &file.contents)?;
    println!("Wrote {} of certificate {} to: {}", kind, id, output_path.display());

    Ok(())
}

fn handle_chain(store: &FileStore, id: u64) -> Result<()> {
    for (depth, certificate) in chain(store, id)?.iter().enumerate() {
        println!(
            "{}{} [{}] {}",
            "  ".repeat(depth),
            certificate.id,
            certificate.profile,
            certificate.name
        );
    }

    Ok(())
}

fn handle_export(store: &FileStore, output: &Path) -> Result<()> {
    let json = export_json(store)?;
    fs::write(output, json)?;
    println!("Exported certificates to: {}", output.display());

    Ok(())
}

fn handle_recover(store: &FileStore, from: &Path) -> Result<()> {
    let contents = fs::read_to_string(from)?;
    let added = store.import(parse_export(&contents)?)?;
    println!(
        "Recovered {} certificate(s) from {} into {}",
        added.len(),
        from.display(),
        store.path().display()
    );

    Ok(())
}
