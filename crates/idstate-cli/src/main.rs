//! `ids`: command-line front end for idstate.
//!
//! Creates identities, issues claims either by anchoring them in the claims
//! tree or by signing them, revokes nonces and prints proofs and
//! state-transition inputs.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use num_bigint::BigUint;

use idstate::crypto::random::random_rev_nonce;
use idstate::storage::{load_key, load_record, read_key_public, save_key, save_record};
use idstate::{
    Claim, ClaimCodec, ClaimOptions, FileStorage, Hash, Id, Identity, IdentityConfig, PrivateKey,
    SchemaHash, SignedClaim, SlotData, Subject, TreeStores,
};

const CONFIG_FILE: &str = "config.json";
const RECORD_FILE: &str = "identity.json";
const KEY_FILE: &str = "auth.key";
const CLAIMS_LOG: &str = "claims.log";
const REVOCATIONS_LOG: &str = "revocations.log";
const ROOTS_LOG: &str = "roots.log";

// ── Directory helpers ─────────────────────────────────────────────────────────

fn idstate_home(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag.or_else(|| std::env::var_os("IDSTATE_HOME").map(PathBuf::from)) {
        return Ok(dir);
    }
    let home = std::env::var_os("HOME").ok_or_else(|| anyhow!("HOME not set"))?;
    Ok(PathBuf::from(home).join(".idstate"))
}

fn tree_stores(dir: &Path) -> Result<TreeStores<FileStorage>> {
    Ok(TreeStores {
        claims: FileStorage::open(dir.join(CLAIMS_LOG)).context("failed to open claims tree")?,
        revocations: FileStorage::open(dir.join(REVOCATIONS_LOG))
            .context("failed to open revocation tree")?,
        roots: FileStorage::open(dir.join(ROOTS_LOG)).context("failed to open roots tree")?,
    })
}

fn open_identity(dir: &Path) -> Result<Identity<FileStorage>> {
    log::debug!("opening identity at {}", dir.display());
    let record_path = dir.join(RECORD_FILE);
    if !record_path.exists() {
        return Err(anyhow!(
            "no identity at {} (run `ids init` first)",
            dir.display()
        ));
    }
    let config = IdentityConfig::load_or_default(&dir.join(CONFIG_FILE))
        .context("failed to load config")?;
    let record = load_record(&record_path).context("failed to load identity record")?;
    Identity::open(config, record, tree_stores(dir)?).context("failed to open identity")
}

fn persist(identity: &Identity<FileStorage>, dir: &Path) -> Result<()> {
    let record = identity.record().context("failed to snapshot identity")?;
    save_record(&record, &dir.join(RECORD_FILE)).context("failed to save identity record")
}

// ── Passphrase helper ─────────────────────────────────────────────────────────

fn read_passphrase(prompt: &str) -> Result<String> {
    if let Ok(passphrase) = std::env::var("IDSTATE_PASSPHRASE") {
        return Ok(passphrase);
    }
    eprint!("{prompt}");
    let mut passphrase = String::new();
    std::io::stdin()
        .read_line(&mut passphrase)
        .context("failed to read passphrase")?;
    Ok(passphrase.trim().to_string())
}

fn unlock(dir: &Path) -> Result<PrivateKey> {
    let passphrase = read_passphrase("Passphrase: ")?;
    load_key(&dir.join(KEY_FILE), &passphrase).context("failed to unlock auth key")
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn emit(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn parse_slot(s: &str) -> Result<SlotData> {
    let value =
        BigUint::parse_bytes(s.as_bytes(), 10).ok_or_else(|| anyhow!("not a decimal integer: {s}"))?;
    Ok(SlotData::from(value))
}

fn parse_slot_pair(values: &[String]) -> Result<Option<(SlotData, SlotData)>> {
    match values {
        [] => Ok(None),
        [a] => Ok(Some((parse_slot(a)?, SlotData::Empty))),
        [a, b] => Ok(Some((parse_slot(a)?, parse_slot(b)?))),
        _ => Err(anyhow!("at most two data values per position")),
    }
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// idstate CLI: self-certifying identity state.
#[derive(Parser, Debug)]
#[command(
    name = "ids",
    about = "idstate CLI",
    version,
    long_about = "ids: idstate CLI\n\nCreate identities, issue and revoke claims, and produce\nsigned state transitions and proofs."
)]
struct Cli {
    /// Identity to operate on
    #[arg(long, global = true, default_value = "default")]
    identity: String,

    /// Data directory (default: $IDSTATE_HOME or ~/.idstate)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Anchor in the claims tree and sign the state transition
    Tree,
    /// Sign the claim hash only
    Signature,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Position {
    Index,
    Value,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new identity
    Init {
        /// Depth of the claims, revocation and roots trees
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Display identity state
    Show,

    /// Issue a claim
    Issue {
        /// Schema hash (32 hex characters)
        #[arg(long)]
        schema: String,

        /// Subject identifier (base58)
        #[arg(long)]
        subject: Option<String>,

        /// Slot holding the subject
        #[arg(long, value_enum, default_value = "index")]
        subject_position: Position,

        /// Index data as decimal integers (up to two)
        #[arg(long, num_args = 1..=2)]
        index: Vec<String>,

        /// Value data as decimal integers (up to two)
        #[arg(long, num_args = 1..=2)]
        value: Vec<String>,

        /// Expiration (RFC 3339, e.g. 2361-03-22T00:44:48Z)
        #[arg(long)]
        expires: Option<String>,

        /// Revocation nonce (default: random)
        #[arg(long)]
        nonce: Option<u64>,

        /// Mark the claim updatable
        #[arg(long)]
        updatable: bool,

        /// Claim version
        #[arg(long, default_value = "0")]
        claim_version: u32,

        /// Issuance mode
        #[arg(long, value_enum, default_value = "tree")]
        mode: Mode,

        /// Write the result JSON to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Revoke a revocation nonce
    Revoke {
        nonce: u64,

        /// Write the transition inputs to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Produce a proof against the current state
    Prove {
        #[command(subcommand)]
        subcommand: ProveCommands,
    },

    /// Verify a signature-only claim
    Verify {
        /// Signed claim JSON file
        file: PathBuf,

        /// Require the issuer key of this local identity
        #[arg(long)]
        issuer: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ProveCommands {
    /// Non-revocation proof for a nonce
    Revocation { nonce: u64 },
    /// Inclusion proof for a claim index hash (decimal)
    Claim { hi: String },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = idstate_home(cli.home).and_then(|home| {
        let dir = home.join(&cli.identity);
        match cli.command {
            Commands::Init { depth } => cmd_init(&cli.identity, &dir, depth, verbose),
            Commands::Show => cmd_show(&cli.identity, &dir, verbose),
            Commands::Issue {
                schema,
                subject,
                subject_position,
                index,
                value,
                expires,
                nonce,
                updatable,
                claim_version,
                mode,
                output,
            } => build_claim(
                &schema,
                subject.as_deref(),
                subject_position,
                &index,
                &value,
                expires.as_deref(),
                nonce,
                updatable,
                claim_version,
            )
            .and_then(|claim| cmd_issue(&dir, &claim, mode, output.as_deref(), verbose)),
            Commands::Revoke { nonce, output } => cmd_revoke(&dir, nonce, output.as_deref()),
            Commands::Prove { subcommand } => match subcommand {
                ProveCommands::Revocation { nonce } => cmd_prove_revocation(&dir, nonce),
                ProveCommands::Claim { hi } => cmd_prove_claim(&dir, &hi),
            },
            Commands::Verify { file, issuer } => cmd_verify(&home, &file, issuer.as_deref()),
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `ids init [--depth N]`
fn cmd_init(name: &str, dir: &Path, depth: Option<usize>, verbose: bool) -> Result<()> {
    if dir.join(RECORD_FILE).exists() {
        return Err(anyhow!(
            "identity '{}' already exists at {}",
            name,
            dir.display()
        ));
    }
    std::fs::create_dir_all(dir).context("failed to create identity directory")?;

    let mut config = IdentityConfig::load_or_default(&dir.join(CONFIG_FILE))
        .context("failed to load config")?;
    if let Some(depth) = depth {
        config = config.with_tree_depth(depth);
    }
    config.validate().context("invalid config")?;

    let passphrase = read_passphrase("Enter passphrase for new identity: ")?;
    if passphrase.is_empty() {
        return Err(anyhow!("passphrase cannot be empty"));
    }

    let key = PrivateKey::generate();
    let public = key.public_key().context("failed to derive public key")?;
    let identity = Identity::genesis(config.clone(), &public, random_rev_nonce(), tree_stores(dir)?)
        .context("failed to create identity")?;
    let id = identity.id();

    config.save(&dir.join(CONFIG_FILE)).context("failed to save config")?;
    save_key(&dir.join(KEY_FILE), &key, &id, &passphrase).context("failed to save auth key")?;
    persist(&identity, dir)?;

    println!("Created identity '{name}'");
    println!("  ID:    {id}");
    println!("  State: {}", identity.genesis_state().state);
    println!("  Dir:   {}", dir.display());
    if verbose {
        println!("  Auth key: ({}, {})", public.x(), public.y());
        println!("  Auth nonce: {}", identity.auth_claim().revocation_nonce());
        println!("  Tree depth: {}", config.tree_depth);
    }
    Ok(())
}

/// `ids show`
fn cmd_show(name: &str, dir: &Path, verbose: bool) -> Result<()> {
    let identity = open_identity(dir)?;
    let current = identity.current_state()?;
    let genesis = identity.genesis_state();

    println!("Identity: {name}");
    println!("  ID:          {}", identity.id());
    println!("  State:       {}", current.state);
    println!("  Claims root: {}", current.claims_root);
    println!("  Rev root:    {}", current.revocation_root);
    println!("  Roots root:  {}", current.roots_root);
    println!("  Transitions: {}", identity.transitions()?);
    if current == *genesis {
        println!("  (genesis state)");
    }

    if verbose {
        let key = identity.auth_key();
        println!("  Genesis:     {}", genesis.state);
        println!("  Auth key:    ({}, {})", key.x(), key.y());
        println!("  Auth nonce:  {}", identity.auth_claim().revocation_nonce());
        println!("  Tree depth:  {}", identity.config().tree_depth);
        let claims = identity.anchored_claims(&current.claims_root)?;
        println!("  Anchored claims ({}):", claims.len());
        for (hi, hv) in claims {
            println!("    hi={hi} hv={hv}");
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_claim(
    schema: &str,
    subject: Option<&str>,
    position: Position,
    index: &[String],
    value: &[String],
    expires: Option<&str>,
    nonce: Option<u64>,
    updatable: bool,
    version: u32,
) -> Result<Claim> {
    let schema = SchemaHash::from_hex(schema).context("invalid schema hash")?;
    let subject = subject
        .map(|s| -> Result<Subject> {
            let id = Id::from_base58(s).context("invalid subject id")?;
            Ok(match position {
                Position::Index => Subject::index(id),
                Position::Value => Subject::value(id),
            })
        })
        .transpose()?;
    let expiration = expires
        .map(|s| -> Result<DateTime<Utc>> {
            Ok(DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("invalid expiration: {s}"))?
                .with_timezone(&Utc))
        })
        .transpose()?;

    let options = ClaimOptions {
        expiration,
        revocation_nonce: nonce.unwrap_or_else(random_rev_nonce),
        subject,
        index_data: parse_slot_pair(index)?,
        value_data: parse_slot_pair(value)?,
        updatable,
        version,
    };
    ClaimCodec::new()
        .encode(&schema, &options)
        .context("failed to encode claim")
}

/// `ids issue --schema HEX [...] [--mode tree|signature]`
fn cmd_issue(
    dir: &Path,
    claim: &Claim,
    mode: Mode,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let identity = open_identity(dir)?;
    let key = unlock(dir)?;

    if verbose {
        let (hi, hv) = claim.hi_hv()?;
        eprintln!("Claim hi={hi} hv={hv} nonce={}", claim.revocation_nonce());
        if let Some(at) = claim.expiration() {
            eprintln!("  Expires: {}", at.to_rfc3339());
        }
    }

    match mode {
        Mode::Tree => {
            let inputs = identity
                .issue_claim(claim, &key)
                .context("failed to issue claim")?;
            persist(&identity, dir)?;
            eprintln!("Issued claim; new state {}", inputs.new_state);
            emit(&inputs.inputs_marshal()?, output)
        }
        Mode::Signature => {
            let signed = identity
                .issue_signed(claim, &key)
                .context("failed to sign claim")?;
            eprintln!("Signed claim hash {}", claim.claim_hash()?);
            emit(&serde_json::to_string_pretty(&signed)?, output)
        }
    }
}

/// `ids revoke NONCE`
fn cmd_revoke(dir: &Path, nonce: u64, output: Option<&Path>) -> Result<()> {
    let identity = open_identity(dir)?;
    let key = unlock(dir)?;
    let inputs = identity
        .revoke_claim(nonce, &key)
        .context("failed to revoke nonce")?;
    persist(&identity, dir)?;
    eprintln!("Revoked nonce {nonce}; new state {}", inputs.new_state);
    emit(&inputs.inputs_marshal()?, output)
}

/// `ids prove revocation NONCE`
fn cmd_prove_revocation(dir: &Path, nonce: u64) -> Result<()> {
    let identity = open_identity(dir)?;
    let current = identity.current_state()?;
    let proof = identity.non_revocation_proof(nonce, &current.revocation_root)?;
    eprintln!("Nonce {nonce}: {:?}", proof.status());
    println!("{}", serde_json::to_string_pretty(&proof)?);
    Ok(())
}

/// `ids prove claim HI`
fn cmd_prove_claim(dir: &Path, hi: &str) -> Result<()> {
    let hi = Hash::from_decimal(hi).context("invalid claim index hash")?;
    let identity = open_identity(dir)?;
    let current = identity.current_state()?;
    let (proof, hv) = identity.claim_proof(&hi, &current.claims_root)?;
    if proof.existence {
        eprintln!("Claim {hi} is anchored (hv={hv})");
    } else {
        eprintln!("Claim {hi} is not anchored");
    }
    println!("{}", serde_json::to_string_pretty(&proof)?);
    Ok(())
}

/// `ids verify FILE [--issuer NAME]`
fn cmd_verify(home: &Path, file: &Path, issuer: Option<&str>) -> Result<()> {
    let json =
        std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let signed: SignedClaim = serde_json::from_str(&json).context("not a signed claim")?;

    let valid = match issuer {
        Some(name) => {
            let (key, id) = read_key_public(&home.join(name).join(KEY_FILE))
                .with_context(|| format!("failed to read issuer '{name}'"))?;
            eprintln!("Issuer: {id}");
            signed.verify_with(&key)
        }
        None => signed.verify(),
    };

    println!("Schema:    {}", signed.claim.schema_hash());
    println!("Nonce:     {}", signed.claim.revocation_nonce());
    if let Some(at) = signed.claim.expiration() {
        println!("Expires:   {}", at.to_rfc3339());
        if signed.claim.is_expired_at(&Utc::now()) {
            println!("           (expired)");
        }
    }
    println!("Signature: {}", if valid { "valid" } else { "INVALID" });

    if valid {
        Ok(())
    } else {
        Err(anyhow!("signature verification failed"))
    }
}

