//! CLI mode for swiftshare - command-line front-end to the SwiftShare service.

mod progress;

use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    AppConfig, BatchLimit, Checkout, CreditStore, Error, FileLibrary, HttpApi, Notice,
    PaymentConfirmation, Plan, Reconciliation, StagedBatch, StagedFile, StaticToken, SwiftShareApi,
    TokioFileSystem, Uploader, files::RECENT_FILES, share_link, upload::GENERIC_UPLOAD_FAILURE,
};

use progress::{
    SpinnerProgress, print_batch, print_files, print_notice, print_plans, print_summary,
    print_transactions,
};

/// A parsed subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Credits,
    Files { recent: bool },
    Upload { paths: Vec<PathBuf>, dashboard: bool },
    Download { id: String, dest: Option<PathBuf> },
    Public { id: String },
    GetPublic { id: String, dest: Option<PathBuf> },
    Delete { id: String },
    Toggle { id: String },
    Link { id: String },
    Plans,
    Buy { plan: String },
    Verify { plan: String, confirmation: PaymentConfirmation },
    Transactions,
    Config,
    Help,
}

/// Global options plus the subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config_path: Option<PathBuf>,
    pub verbosity: u8,
    pub command: Command,
}

pub fn print_usage() {
    eprintln!("Usage: swiftshare [OPTIONS] <COMMAND>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  credits                           Show the credit balance");
    eprintln!("  files [--recent]                  List your files (--recent: dashboard view)");
    eprintln!("  upload [--dashboard] <FILE>...    Upload files, one credit each");
    eprintln!("  download <ID> [-o DIR]            Download one of your files");
    eprintln!("  public <ID>                       Show a shared file without signing in");
    eprintln!("  get-public <ID> [-o DIR]          Download a shared file without signing in");
    eprintln!("  delete <ID>                       Delete a file");
    eprintln!("  toggle <ID>                       Switch a file between public and private");
    eprintln!("  link <ID>                         Print the share link of a file");
    eprintln!("  plans                             List credit plans");
    eprintln!("  buy <PLAN>                        Create a payment order for a plan");
    eprintln!("  verify <PLAN> <ORDER> <PAYMENT> <SIGNATURE>");
    eprintln!("                                    Confirm a completed payment");
    eprintln!("  transactions                      Show payment history");
    eprintln!("  config                            Print the effective configuration");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Config file (default: $XDG_CONFIG_HOME/swiftshare/config.toml)");
    eprintln!("  -v, --verbose         More logging (repeatable)");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment: SWIFTSHARE_TOKEN, SWIFTSHARE_API_URL, SWIFTSHARE_CONFIG, RUST_LOG");
}

fn take_id(rest: &[String], command: &str) -> Result<String, String> {
    match rest {
        [id] => Ok(id.clone()),
        _ => Err(format!("{command} expects exactly one file id")),
    }
}

/// Splits `-o DIR` out of the remaining arguments.
fn take_dest(rest: &[String]) -> Result<(Vec<String>, Option<PathBuf>), String> {
    let mut positional = Vec::new();
    let mut dest = None;
    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let dir = iter.next().ok_or("-o requires a directory")?;
                dest = Some(PathBuf::from(dir));
            }
            _ => positional.push(arg.clone()),
        }
    }
    Ok((positional, dest))
}

/// Parses the command line (without the program name).
///
/// # Errors
///
/// Returns a message describing the first problem found.
pub fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut config_path = None;
    let mut verbosity = 0;
    let mut i = 0;

    // Global flags come before the subcommand
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => {
                i += 1;
                let path = args.get(i).ok_or("--config requires a value")?;
                config_path = Some(PathBuf::from(path));
            }
            "-v" | "--verbose" => verbosity += 1,
            "-vv" => verbosity += 2,
            "-h" | "--help" => {
                return Ok(Invocation {
                    config_path,
                    verbosity,
                    command: Command::Help,
                });
            }
            _ => break,
        }
        i += 1;
    }

    let Some(name) = args.get(i) else {
        return Ok(Invocation {
            config_path,
            verbosity,
            command: Command::Help,
        });
    };
    let rest = &args[i + 1..];

    let command = match name.as_str() {
        "credits" => Command::Credits,
        "files" | "ls" => Command::Files {
            recent: rest.iter().any(|a| a == "--recent"),
        },
        "upload" => {
            let dashboard = rest.iter().any(|a| a == "--dashboard");
            let paths: Vec<PathBuf> = rest
                .iter()
                .filter(|a| *a != "--dashboard")
                .map(PathBuf::from)
                .collect();
            Command::Upload { paths, dashboard }
        }
        "download" => {
            let (positional, dest) = take_dest(rest)?;
            Command::Download {
                id: take_id(&positional, "download")?,
                dest,
            }
        }
        "get-public" => {
            let (positional, dest) = take_dest(rest)?;
            Command::GetPublic {
                id: take_id(&positional, "get-public")?,
                dest,
            }
        }
        "public" => Command::Public {
            id: take_id(rest, "public")?,
        },
        "delete" | "rm" => Command::Delete {
            id: take_id(rest, "delete")?,
        },
        "toggle" => Command::Toggle {
            id: take_id(rest, "toggle")?,
        },
        "link" => Command::Link {
            id: take_id(rest, "link")?,
        },
        "plans" => Command::Plans,
        "buy" => Command::Buy {
            plan: take_id(rest, "buy").map_err(|_| "buy expects a plan id".to_string())?,
        },
        "verify" => match rest {
            [plan, order, payment, signature] => Command::Verify {
                plan: plan.clone(),
                confirmation: PaymentConfirmation {
                    order_id: order.clone(),
                    payment_id: payment.clone(),
                    signature: signature.clone(),
                },
            },
            _ => return Err("verify expects <PLAN> <ORDER> <PAYMENT> <SIGNATURE>".to_string()),
        },
        "transactions" | "tx" => Command::Transactions,
        "config" => Command::Config,
        "help" => Command::Help,
        other => return Err(format!("unknown command: {other}")),
    };

    Ok(Invocation {
        config_path,
        verbosity,
        command,
    })
}

/// Shared handles every command works with.
struct Context {
    config: AppConfig,
    api: Arc<dyn SwiftShareApi>,
    credits: CreditStore,
}

impl Context {
    fn new(config: AppConfig) -> crate::Result<Self> {
        let tokens = Arc::new(StaticToken::new(config.api.token.clone()));
        let api: Arc<dyn SwiftShareApi> = Arc::new(HttpApi::new(&config.api, tokens)?);
        let credits = CreditStore::new(api.clone());
        Ok(Self {
            config,
            api,
            credits,
        })
    }
}

async fn upload(ctx: &Context, paths: Vec<PathBuf>, dashboard: bool) -> crate::Result<()> {
    let max = if dashboard {
        BatchLimit::DASHBOARD
    } else {
        ctx.config.upload.max_batch
    };
    let fs = TokioFileSystem::new();
    let mut selection = Vec::with_capacity(paths.len());
    for path in &paths {
        selection.push(StagedFile::from_path(&fs, path).await?);
    }

    let mut batch = StagedBatch::new(max);
    batch.add_files(selection)?;

    ctx.credits.refresh().await?;
    print_batch(&batch, ctx.credits.read());

    let uploader = Uploader::new(ctx.api.clone(), ctx.credits.clone());
    let receipt = uploader.submit(&mut batch, &SpinnerProgress::new()).await?;
    println!("{} credit(s) remaining", receipt.balance);
    Ok(())
}

async fn dispatch(ctx: &Context, command: Command) -> crate::Result<()> {
    match command {
        Command::Credits => {
            let credits = ctx.credits.refresh().await?;
            println!("{credits} credit(s), enough for {credits} file upload(s)");
        }
        Command::Files { recent } => {
            let mut library = FileLibrary::new(ctx.api.clone());
            let (files, credits) = futures::join!(library.refresh(), ctx.credits.refresh());
            files?;
            if recent {
                print_summary(&library.summary(), credits.unwrap_or_else(|_| ctx.credits.read()));
                print_files(library.recent(RECENT_FILES));
            } else {
                print_files(library.files());
            }
        }
        Command::Upload { paths, dashboard } => upload(ctx, paths, dashboard).await?,
        Command::Download { id, dest } => {
            let library = FileLibrary::new(ctx.api.clone());
            let dest = dest.unwrap_or_else(|| ctx.config.paths.download_dir.clone());
            let path = library.download(&id, &dest).await?;
            print_notice(&Notice::success(format!("Saved {}", path.display())));
        }
        Command::Public { id } => {
            let file = FileLibrary::new(ctx.api.clone()).public_file(&id).await?;
            print_files([&file]);
            println!("\n{}", share_link(&ctx.config.share.public_base_url, &file.id));
        }
        Command::GetPublic { id, dest } => {
            let library = FileLibrary::new(ctx.api.clone());
            let dest = dest.unwrap_or_else(|| ctx.config.paths.download_dir.clone());
            let path = library.download_public(&id, &dest).await?;
            print_notice(&Notice::success(format!("Saved {}", path.display())));
        }
        Command::Delete { id } => {
            let mut library = FileLibrary::new(ctx.api.clone());
            library.delete(&id).await?;
            print_notice(&Notice::success("File deleted successfully"));
        }
        Command::Toggle { id } => {
            let mut library = FileLibrary::new(ctx.api.clone());
            library.refresh().await?;
            let file = library.toggle_visibility(&id).await?;
            let state = if file.is_public { "public" } else { "private" };
            print_notice(&Notice::success(format!("{} is now {state}", file.name)));
            if file.is_public {
                println!("{}", share_link(&ctx.config.share.public_base_url, &file.id));
            }
        }
        Command::Link { id } => {
            println!("{}", share_link(&ctx.config.share.public_base_url, &id));
        }
        Command::Plans => {
            // The catalog is static; show it even if the balance is unavailable
            let _ = ctx.credits.refresh().await;
            print_plans(ctx.credits.read());
        }
        Command::Buy { plan } => {
            let plan = Plan::find(&plan).ok_or(Error::UnknownPlan(plan))?;
            let order = Checkout::new(ctx.api.clone(), ctx.credits.clone())
                .start(plan)
                .await?;
            print_notice(&Notice::info(format!(
                "Order {} created for the {} plan ({})",
                order.order_id,
                plan.name,
                crate::format_amount(order.amount, &order.currency)
            )));
            println!("Complete the payment in the checkout page, then run:");
            println!(
                "  swiftshare verify {} {} <PAYMENT_ID> <SIGNATURE>",
                plan.id, order.order_id
            );
        }
        Command::Verify { plan, confirmation } => {
            let plan = Plan::find(&plan).ok_or(Error::UnknownPlan(plan))?;
            let receipt = Checkout::new(ctx.api.clone(), ctx.credits.clone())
                .complete(plan, confirmation)
                .await?;
            print_notice(&Notice::success(receipt.message()));
            if receipt.reconciliation == Reconciliation::Stale {
                print_notice(&Notice::info(
                    "Balance could not be refreshed; run `swiftshare credits` to see it",
                ));
            } else {
                println!("{} credit(s) available", receipt.balance);
            }
        }
        Command::Transactions => {
            let transactions = Checkout::new(ctx.api.clone(), ctx.credits.clone())
                .transactions()
                .await?;
            print_transactions(&transactions);
        }
        Command::Config => {
            let mut shown = ctx.config.clone();
            if shown.api.token.is_some() {
                shown.api.token = Some("<redacted>".to_string());
            }
            let text = toml::to_string_pretty(&shown).map_err(|e| Error::Config(e.to_string()))?;
            print!("{text}");
        }
        Command::Help => print_usage(),
    }
    Ok(())
}

/// Runs a parsed invocation.
///
/// Failures are printed as notices; the returned error lets the binary pick
/// the exit code.
///
/// # Errors
///
/// Returns the first error a command hit.
pub async fn run(invocation: Invocation) -> crate::Result<()> {
    let config_path = invocation
        .config_path
        .unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path)?;
    log::debug!("Using API at {}", config.api.base_url);

    let fallback = match invocation.command {
        Command::Upload { .. } => GENERIC_UPLOAD_FAILURE,
        _ => "Request failed. Please try again.",
    };
    let ctx = Context::new(config)?;
    let result = dispatch(&ctx, invocation.command).await;
    if let Err(e) = &result {
        print_notice(&Notice::error(e.user_message(fallback)));
    }
    result
}
