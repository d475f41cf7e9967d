//! xtrust: Command-line front end for X.509 trust evaluation.

mod config;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xtrust_lib::{
    AltNameType, Certificate, Credential, Crl, Criteria, NameEvaluatorConfig, TrustEngine,
    TrustedNameSet, ValidationInformation, ValidationOptions, ValidationReport,
};

#[derive(Parser)]
#[command(
    name = "xtrust",
    about = "Evaluate whether X.509 credentials are trusted",
    long_about = "xtrust decodes certificates and CRLs, validates certification paths\n\
                  against configured trust anchors, and matches credential names\n\
                  against a trusted set.\n\n\
                  Input format (PEM vs DER) is auto-detected. Certificate arguments\n\
                  read from stdin when omitted or given as '-'.\n\n\
                  Exit status: 0 = trusted, 1 = not trusted, 2 = error.",
    after_help = "EXAMPLES:\n\
                  \n  xtrust decode cert.pem\
                  \n  xtrust decode --crl --json issuer.crl\
                  \n  xtrust validate --anchor root.pem --chain chain.pem cert.pem\
                  \n  xtrust match-names --name www.example.com cert.pem\
                  \n  xtrust evaluate --config trust.toml --entity-id idp cert.pem\
                  \n  cat cert.pem | xtrust decode"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). Defaults to RUST_LOG or warn.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display certificates or CRLs
    #[command(after_help = "EXAMPLES:\n\
                      \n  xtrust decode cert.pem\
                      \n  xtrust decode --json bundle.pem\
                      \n  xtrust decode --crl issuer.crl")]
    Decode {
        /// Input file (PEM or DER). Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Decode CRLs instead of certificates
        #[arg(long)]
        crl: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Validate a certification path to a trust anchor (exit 0 = valid, 1 = invalid)
    #[command(after_help = "The certificate input may be a bundle: the first certificate is\n\
                      the entity, the rest are treated as untrusted supporting certificates.\n\
                      \nEXAMPLES:\n\
                      \n  xtrust validate --anchor root.pem cert.pem\
                      \n  xtrust validate --anchor root.pem --chain intermediates.pem cert.pem\
                      \n  xtrust validate --anchor root.pem --crl inter.crl --max-depth 2 cert.pem\
                      \n  xtrust validate --anchor root.pem --at 1700000000 --json cert.pem")]
    Validate {
        /// Certificate or bundle to validate. Reads from stdin if omitted.
        cert: Option<PathBuf>,
        /// Trust anchor file (PEM bundle or DER). May be repeated.
        #[arg(long = "anchor", required = true)]
        anchors: Vec<PathBuf>,
        /// CRL file (PEM bundle or DER). May be repeated.
        #[arg(long = "crl")]
        crls: Vec<PathBuf>,
        /// Additional untrusted supporting certificates
        #[arg(long)]
        chain: Option<PathBuf>,
        /// Maximum number of intermediate certificates
        #[arg(long)]
        max_depth: Option<u32>,
        /// Validate at a specific Unix timestamp instead of now
        #[arg(long)]
        at: Option<i64>,
        /// Show the accepted path
        #[arg(long)]
        show_path: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Match certificate names against trusted names (exit 0 = match, 1 = no match)
    #[command(after_help = "ALT NAME TYPES:\n\
                      \n  dns, uri, email, ip, dirname, othername, x400, ediparty, registeredid\
                      \n\nEXAMPLES:\n\
                      \n  xtrust match-names --name www.example.com cert.pem\
                      \n  xtrust match-names --name 10.0.0.1 --alt-type ip cert.pem\
                      \n  xtrust match-names --name 'CN=idp,O=Example' --no-cn --no-alt-names cert.pem")]
    MatchNames {
        /// Certificate file (PEM or DER). Reads from stdin if omitted.
        cert: Option<PathBuf>,
        /// Trusted name. May be repeated.
        #[arg(long = "name", required = true)]
        names: Vec<String>,
        /// Do not match the subject common name
        #[arg(long)]
        no_cn: bool,
        /// Do not match the full subject DN
        #[arg(long)]
        no_dn: bool,
        /// Do not match subject alternative names
        #[arg(long)]
        no_alt_names: bool,
        /// Alternative name type to match (default: dns and uri). May be repeated.
        #[arg(long = "alt-type")]
        alt_types: Vec<AltNameType>,
    },
    /// Evaluate a credential against resolver candidates from a TOML config
    #[command(after_help = "EXAMPLES:\n\
                      \n  xtrust evaluate --config trust.toml cert.pem\
                      \n  xtrust evaluate --config trust.toml --entity-id https://idp.example.org cert.pem\
                      \n  xtrust evaluate --config trust.toml --chain chain.pem --crl inter.crl cert.pem")]
    Evaluate {
        /// Certificate or bundle to evaluate. Reads from stdin if omitted.
        cert: Option<PathBuf>,
        /// Trust configuration file
        #[arg(long)]
        config: PathBuf,
        /// Entity id used to select candidates
        #[arg(long)]
        entity_id: Option<String>,
        /// Additional untrusted supporting certificates
        #[arg(long)]
        chain: Option<PathBuf>,
        /// CRL carried with the credential. May be repeated.
        #[arg(long = "crl")]
        crls: Vec<PathBuf>,
        /// Evaluate at a specific Unix timestamp instead of now
        #[arg(long)]
        at: Option<i64>,
    },
}

/// Maximum file size for certificate inputs (10 MiB).
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) if path != Path::new("-") => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat file: {}", path.display()))?;
            if meta.len() > MAX_INPUT_BYTES {
                anyhow::bail!(
                    "File too large ({} bytes, max {} bytes): {}",
                    meta.len(),
                    MAX_INPUT_BYTES,
                    path.display()
                );
            }
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
        }
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn input_label(file: Option<&Path>) -> String {
    match file {
        Some(path) if path != Path::new("-") => path.display().to_string(),
        _ => "stdin".to_string(),
    }
}

pub(crate) fn load_certificates(path: &Path) -> Result<Vec<Certificate>> {
    let input = read_input(Some(path))?;
    xtrust_lib::decode_certificates(&input)
        .with_context(|| format!("Failed to decode certificates: {}", path.display()))
}

pub(crate) fn load_crls(path: &Path) -> Result<Vec<Crl>> {
    let input = read_input(Some(path))?;
    xtrust_lib::decode_crls(&input)
        .with_context(|| format!("Failed to decode CRLs: {}", path.display()))
}

/// Read the credential under evaluation, appending any separate chain file.
fn load_credential(
    cert: Option<&Path>,
    chain: Option<&Path>,
    crl_files: &[PathBuf],
) -> Result<Credential> {
    let input = read_input(cert)?;
    let mut credential = Credential::from_pem_bundle(&input)
        .with_context(|| format!("Failed to decode credential: {}", input_label(cert)))?;
    if let Some(path) = chain {
        credential.chain.extend(load_certificates(path)?);
    }
    for path in crl_files {
        credential.crls.extend(load_crls(path)?);
    }
    debug!(
        chain = credential.chain.len(),
        crls = credential.crls.len(),
        "loaded credential"
    );
    Ok(credential)
}

fn name_config(
    no_cn: bool,
    no_dn: bool,
    no_alt_names: bool,
    alt_types: &[AltNameType],
) -> NameEvaluatorConfig {
    let mut config = NameEvaluatorConfig {
        check_subject_alt_names: !no_alt_names,
        check_subject_dn: !no_dn,
        check_subject_dn_cn: !no_cn,
        ..NameEvaluatorConfig::default()
    };
    if !alt_types.is_empty() {
        config = config.with_alt_name_types(alt_types.iter().copied());
    }
    config
}

fn print_report(label: &str, report: &ValidationReport, json: bool, show_path: bool) -> Result<()> {
    if json {
        println!("{}", xtrust_lib::to_json(report)?);
    } else if report.is_valid {
        println!("{}: {}", label, report);
        if show_path {
            for info in &report.path {
                let marker = if info.trust_anchor { " (anchor)" } else { "" };
                println!(
                    "depth {}: subject = {}, issuer = {}{}",
                    info.depth, info.subject, info.issuer, marker
                );
            }
        }
    } else {
        eprintln!("{}: {}", label, report);
    }
    Ok(())
}

fn verdict(trusted: bool) -> &'static str {
    if trusted {
        "TRUSTED"
    } else {
        "NOT TRUSTED"
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run a command. `Ok(true)` means the credential (or every decoded
/// object) passed.
fn run(command: &Commands) -> Result<bool> {
    match command {
        Commands::Decode { file, crl, json } => {
            let input = read_input(file.as_deref())?;
            if *crl {
                let crls = xtrust_lib::decode_crls(&input)?;
                if *json {
                    println!("{}", xtrust_lib::to_json(&crls)?);
                } else {
                    for c in &crls {
                        print!("{}", xtrust_lib::display_crl(c));
                    }
                }
            } else {
                let certs = xtrust_lib::decode_certificates(&input)?;
                if *json {
                    println!("{}", xtrust_lib::to_json(&certs)?);
                } else {
                    for c in &certs {
                        print!("{}", xtrust_lib::display_certificate(c));
                    }
                }
            }
            Ok(true)
        }

        Commands::Validate {
            cert,
            anchors,
            crls,
            chain,
            max_depth,
            at,
            show_path,
            json,
        } => {
            let credential = load_credential(cert.as_deref(), chain.as_deref(), &[])?;
            let mut trust_anchors = Vec::new();
            for path in anchors {
                trust_anchors.extend(load_certificates(path)?);
            }
            let mut trusted_crls = Vec::new();
            for path in crls {
                trusted_crls.extend(load_crls(path)?);
            }
            let mut info = ValidationInformation::new(trust_anchors).with_crls(trusted_crls);
            info.max_path_depth = *max_depth;
            let options = ValidationOptions {
                at_time: *at,
                ..Default::default()
            };

            let report = xtrust_lib::validate_report(&info, &credential, &options)?;
            print_report(&input_label(cert.as_deref()), &report, *json, *show_path)?;
            Ok(report.is_valid)
        }

        Commands::MatchNames {
            cert,
            names,
            no_cn,
            no_dn,
            no_alt_names,
            alt_types,
        } => {
            let input = read_input(cert.as_deref())?;
            let certificate = xtrust_lib::decode_certificates(&input)?
                .into_iter()
                .next()
                .context("No certificate found")?;
            let trusted: TrustedNameSet = names.iter().cloned().collect();
            let config = name_config(*no_cn, *no_dn, *no_alt_names, alt_types);
            let matched = xtrust_lib::matches(&certificate, Some(&trusted), &config)?;
            let label = input_label(cert.as_deref());
            if matched {
                println!("{}: MATCH", label);
            } else {
                eprintln!("{}: NO MATCH", label);
            }
            Ok(matched)
        }

        Commands::Evaluate {
            cert,
            config,
            entity_id,
            chain,
            crls,
            at,
        } => {
            let trust_config = config::TrustConfig::load(config)?;
            let resolver = trust_config.build_resolver()?;
            let mut options = trust_config.options;
            if at.is_some() {
                options.at_time = *at;
            }
            let engine = TrustEngine::new(resolver)
                .with_name_config(trust_config.names.clone())
                .with_options(options);

            let credential = load_credential(cert.as_deref(), chain.as_deref(), crls)?;
            let criteria = Criteria {
                entity_id: entity_id.clone(),
            };
            let trusted = engine.evaluate(&credential, &criteria)?;
            let label = input_label(cert.as_deref());
            if trusted {
                println!("{}: {}", label, verdict(trusted));
            } else {
                eprintln!("{}: {}", label, verdict(trusted));
            }
            Ok(trusted)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../xtrust-lib/tests/data")
            .join(name)
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    // ---- Argument parsing ----

    #[test]
    fn validate_requires_an_anchor() {
        assert!(Cli::try_parse_from(["xtrust", "validate", "cert.pem"]).is_err());
    }

    #[test]
    fn validate_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "xtrust", "-vv", "validate", "--anchor", "a.pem", "--anchor", "b.pem", "--crl",
            "x.crl", "--max-depth", "2", "--at", "1700000000", "cert.pem",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Validate {
                anchors,
                crls,
                max_depth,
                at,
                cert,
                ..
            } => {
                assert_eq!(anchors.len(), 2);
                assert_eq!(crls, vec![PathBuf::from("x.crl")]);
                assert_eq!(max_depth, Some(2));
                assert_eq!(at, Some(1_700_000_000));
                assert_eq!(cert, Some(PathBuf::from("cert.pem")));
            }
            _ => panic!("expected validate"),
        }
    }

    #[test]
    fn match_names_parses_alt_types() {
        let cli = Cli::try_parse_from([
            "xtrust", "match-names", "--name", "10.1.2.3", "--alt-type", "ip", "--alt-type",
            "DNS", "--no-cn",
        ])
        .unwrap();
        match cli.command {
            Commands::MatchNames {
                alt_types, no_cn, ..
            } => {
                assert_eq!(alt_types, vec![AltNameType::Ip, AltNameType::Dns]);
                assert!(no_cn);
            }
            _ => panic!("expected match-names"),
        }
        assert!(Cli::try_parse_from([
            "xtrust", "match-names", "--name", "x", "--alt-type", "bogus"
        ])
        .is_err());
    }

    // ---- Helpers ----

    #[test]
    fn name_config_defaults_alt_types() {
        let config = name_config(false, true, false, &[]);
        assert!(!config.check_subject_dn);
        assert_eq!(
            config.alt_name_types,
            NameEvaluatorConfig::default().alt_name_types
        );
        let config = name_config(false, false, false, &[AltNameType::Email]);
        assert_eq!(config.alt_name_types.len(), 1);
    }

    #[test]
    fn input_label_for_stdin() {
        assert_eq!(input_label(None), "stdin");
        assert_eq!(input_label(Some(Path::new("-"))), "stdin");
        assert_eq!(input_label(Some(Path::new("a.pem"))), "a.pem");
    }

    #[test]
    fn read_input_reports_missing_file() {
        let err = read_input(Some(Path::new("/nonexistent/cert.pem"))).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/cert.pem"));
    }

    // ---- Commands ----

    #[test]
    fn validate_command_against_fixtures() {
        let command = Commands::Validate {
            cert: Some(fixture("foo-1A1-good.crt")),
            anchors: vec![fixture("root1-ca.crt")],
            crls: vec![fixture("inter1A1-v1.crl")],
            chain: None,
            max_depth: None,
            at: Some(1_700_000_000),
            show_path: false,
            json: true,
        };
        // No supporting certificates were supplied.
        assert!(!run(&command).unwrap());
    }

    #[test]
    fn load_credential_appends_chain_file() {
        let credential = load_credential(
            Some(&fixture("foo-1A1-good.crt")),
            Some(&fixture("inter1A1-ca.crt")),
            &[fixture("inter1A1-v1.crl")],
        )
        .unwrap();
        assert_eq!(credential.chain.len(), 1);
        assert_eq!(credential.crls.len(), 1);
    }

    #[test]
    fn match_names_command_against_fixture() {
        let command = Commands::MatchNames {
            cert: Some(fixture("foo-1A1-good.crt")),
            names: vec!["foo-alt.example.org".into()],
            no_cn: true,
            no_dn: true,
            no_alt_names: false,
            alt_types: vec![],
        };
        assert!(run(&command).unwrap());
    }
}
