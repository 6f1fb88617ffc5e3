use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, Timelike};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use tracing::debug;

use dv_core::{
    Challenge, ChallengeService, FsCatalog, ImageRef, SystemClock, UpdateResult, VaultDirectory,
    VerifyResult,
};
use dv_crypto::passgen::{self, DEFAULT_PASSWORD_LEN};
use dv_crypto::SecretCipher;
use dv_store::Store;

#[derive(Parser)]
#[command(name = "decoyvault")]
#[command(about = "Password vault guarded by an image-recognition challenge", long_about = None)]
struct Cli {
    /// Data directory (database, key file, decoy images)
    #[arg(long, env = "DECOYVAULT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new vault (prompts for a numeric PIN)
    Register {
        /// Vault name
        name: String,
    },

    /// Log into a vault and list its credentials
    Login {
        /// Vault name
        name: String,
    },

    /// Add a credential to a vault (prompts for the secret)
    Add {
        /// Vault id (from `login`)
        vault_id: String,
        /// Platform or site the secret belongs to
        platform: String,
        /// Identifier of the secret image to recognize later
        image: String,
        /// Decoy category of the secret image
        #[arg(short, long)]
        category: Option<String>,
        /// Generate the secret instead of prompting
        #[arg(short, long)]
        generate: bool,
    },

    /// Reveal a credential by picking its secret image from the gallery
    Reveal {
        /// Credential id (from `login`)
        credential_id: String,
    },

    /// Change a credential's secret and/or secret image
    Update {
        /// Credential id
        credential_id: String,
        /// New secret image identifier
        #[arg(short, long)]
        image: Option<String>,
        /// Also rotate the secret itself (prompts for the new value)
        #[arg(short, long)]
        rotate_secret: bool,
    },

    /// Generate a random password without storing anything
    Gen {
        /// Password length
        #[arg(short, long, default_value_t = DEFAULT_PASSWORD_LEN)]
        length: usize,
        /// Include punctuation characters
        #[arg(short, long)]
        symbols: bool,
    },
}

/// Everything a command needs, bootstrapped from the data directory.
struct App {
    store: Store,
    directory: VaultDirectory,
    service: ChallengeService,
}

impl App {
    async fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => ProjectDirs::from("", "", "decoyvault")
                .ok_or_else(|| anyhow!("cannot determine a data directory"))?
                .data_dir()
                .to_path_buf(),
        };
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating {}", data_dir.display()))?;
        debug!(data_dir = %data_dir.display(), "opening");

        let store = Store::open(&data_dir.join("vault.db")).await?;
        let cipher = Arc::new(load_or_create_key(&data_dir.join("secret.key"))?);
        let catalog = Arc::new(FsCatalog::new(data_dir.join("decoys")));

        Ok(Self {
            directory: VaultDirectory::new(store.clone()),
            service: ChallengeService::new(store.clone(), cipher, catalog, Arc::new(SystemClock)),
            store,
        })
    }
}

/// Load the at-rest key, generating one on first run.  The file itself is the
/// protection boundary, so it is created owner-readable only.
fn load_or_create_key(path: &std::path::Path) -> Result<SecretCipher> {
    if path.exists() {
        let encoded = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        return Ok(SecretCipher::from_base64(&encoded)?);
    }

    let cipher = SecretCipher::generate();
    fs::write(path, cipher.export_base64())
        .with_context(|| format!("writing {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(cipher)
}

fn greeting() -> &'static str {
    match Local::now().hour() {
        0..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening",
    }
}

fn prompt_pin(prompt: &str) -> Result<String> {
    Ok(rpassword::prompt_password(prompt)?)
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let app = App::open(cli.data_dir).await?;

    match cli.command {
        Commands::Register { name } => {
            let pin = prompt_pin("Choose a numeric PIN: ")?;
            let confirm = prompt_pin("Confirm PIN: ")?;
            if pin != confirm {
                bail!("PINs do not match");
            }
            let vault = app.directory.register(&name, &pin).await?;
            println!("Vault '{}' created: {}", vault.name, vault.id);
        }

        Commands::Login { name } => {
            let pin = prompt_pin("PIN: ")?;
            let login = app.directory.authenticate(&name, &pin).await?;
            // Matched and shadow logins print the same thing, on purpose.
            let vault = login.vault();
            println!("{}, {}!", greeting(), vault.name);

            let credentials = app.store.list_credentials(&vault.id).await?;
            if credentials.is_empty() {
                println!("No credentials stored yet. Add one with `decoyvault add {}`.", vault.id);
            } else {
                for cred in credentials {
                    println!("  {}  {}  (image: {})", cred.id, cred.platform, cred.image_path);
                }
            }
        }

        Commands::Add {
            vault_id,
            platform,
            image,
            category,
            generate,
        } => {
            let secret = if generate {
                let generated = passgen::generate_password(DEFAULT_PASSWORD_LEN, true);
                println!("Generated secret: {generated}");
                generated
            } else {
                prompt_pin("Secret to store: ")?
            };
            let row = app
                .service
                .add_credential(
                    &vault_id,
                    &platform,
                    &secret,
                    &ImageRef::new(image),
                    category.as_deref(),
                )
                .await?;
            println!("Credential stored: {}", row.id);
        }

        Commands::Reveal { credential_id } => {
            let entries = match app.service.start_challenge(&credential_id).await? {
                Challenge::Locked { lock_until } => {
                    println!("Too many wrong attempts. Locked until {lock_until}.");
                    return Ok(());
                }
                Challenge::Gallery { entries } => entries,
            };

            println!("Pick your secret image:");
            for (i, entry) in entries.iter().enumerate() {
                println!("  [{:>2}] {}", i + 1, entry.image);
            }
            let picked = prompt_line("Choice: ")?;
            let index: usize = picked.parse().context("enter the number of a tile")?;
            let entry = entries
                .get(index.checked_sub(1).ok_or_else(|| anyhow!("tiles start at 1"))?)
                .ok_or_else(|| anyhow!("no tile number {index}"))?;

            match app.service.submit_choice(&credential_id, &entry.image).await? {
                VerifyResult::Revealed { secret } => println!("Secret: {secret}"),
                VerifyResult::InfoNotice { failed_attempts } => {
                    println!("{}. That was not it (attempt {failed_attempts}).", greeting());
                }
                VerifyResult::FinalWarning { failed_attempts } => {
                    println!(
                        "Wrong again (attempt {failed_attempts}). One more and this credential locks for 24 hours."
                    );
                }
                VerifyResult::LockedOut { lock_until } => {
                    println!("Locked until {lock_until}.");
                }
                VerifyResult::Locked { lock_until } => {
                    println!("Already locked until {lock_until}.");
                }
            }
        }

        Commands::Update {
            credential_id,
            image,
            rotate_secret,
        } => {
            let current = prompt_pin("Current secret: ")?;
            let new_secret = if rotate_secret {
                Some(prompt_pin("New secret: ")?)
            } else {
                None
            };
            let new_image = image.map(ImageRef::new);
            let result = app
                .service
                .change_security(
                    &credential_id,
                    &current,
                    new_secret.as_deref(),
                    new_image.as_ref(),
                )
                .await?;
            match result {
                UpdateResult::Updated => println!("Security details updated."),
                UpdateResult::WrongPassword => bail!("current secret does not match"),
            }
        }

        Commands::Gen { length, symbols } => {
            println!("{}", passgen::generate_password(length, symbols));
        }
    }

    Ok(())
}
