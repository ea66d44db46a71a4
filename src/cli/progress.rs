//! Spinners, notices and tables for CLI output.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    LibrarySummary, Notice, NoticeKind, PLANS, RemoteFileRecord, StagedBatch, Transaction,
    UploadProgress, UploadReceipt, format_amount, format_size, format_timestamp,
};

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Prints a notice, errors to stderr.
pub fn print_notice(notice: &Notice) {
    match notice.kind {
        NoticeKind::Success => println!("{} {}", style("✓").green().bold(), notice.text),
        NoticeKind::Info => println!("{} {}", style("i").cyan().bold(), notice.text),
        NoticeKind::Error => eprintln!("{} {}", style("✗").red().bold(), notice.text),
    }
}

/// Shows a spinner while the upload request is in flight.
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                .expect("spinner template is valid"),
        );
        Self { bar }
    }
}

impl UploadProgress for SpinnerProgress {
    fn on_start(&self, files: usize, bytes: u64) {
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_message(format!(
            "Uploading {files} file(s), {}...",
            format_size(bytes)
        ));
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_complete(&self, receipt: &UploadReceipt) {
        self.bar.finish_and_clear();
        print_notice(&receipt.notice());
    }

    // The caller prints the failure once the submission returns
    fn on_error(&self, _notice: &Notice) {
        self.bar.finish_and_clear();
    }
}

/// Prints the staged batch before it is sent.
pub fn print_batch(batch: &StagedBatch, balance: u64) {
    println!("\n{SEPARATOR}");
    println!(
        "{} of {} files selected, {} credit(s) available",
        batch.len(),
        batch.max_batch(),
        balance
    );
    println!("{SEPARATOR}");
    for (i, file) in batch.iter().enumerate() {
        println!("  {:>2}. {} ({})", i + 1, file.name, format_size(file.size));
    }
    println!("{SEPARATOR}\n");
}

/// Prints a table of files.
pub fn print_files<'a>(files: impl IntoIterator<Item = &'a RemoteFileRecord>) {
    let mut any = false;
    for file in files {
        if !any {
            println!(
                "{:<26} {:<8} {:>10}  {:<16}  NAME",
                "ID", "SHARING", "SIZE", "UPLOADED"
            );
            any = true;
        }
        let sharing = if file.is_public {
            style("public").green()
        } else {
            style("private").dim()
        };
        println!(
            "{:<26} {:<8} {:>10}  {:<16}  {}",
            file.id,
            sharing,
            format_size(file.size),
            format_timestamp(file.upload_at),
            file.name
        );
    }
    if !any {
        println!("No files uploaded yet.");
    }
}

/// Prints the dashboard totals.
pub fn print_summary(summary: &LibrarySummary, credits: u64) {
    println!("{SEPARATOR}");
    println!("  Total files:        {}", summary.total_files);
    println!("  Public files:       {}", summary.public_files);
    println!("  Storage used:       {}", format_size(summary.total_bytes));
    println!("  Credits available:  {credits}");
    println!("{SEPARATOR}");
}

/// Prints the plan catalog.
pub fn print_plans(credits: u64) {
    println!("Current balance: {credits} credit(s)\n");
    for plan in &PLANS {
        let tag = if plan.recommended {
            style(" (recommended)").yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<12} {:<12} {:>14} credits  {}{tag}",
            plan.id,
            plan.name,
            plan.credits,
            format_amount(plan.amount_minor(), crate::payments::CURRENCY)
        );
    }
}

/// Prints the payment history.
pub fn print_transactions(transactions: &[Transaction]) {
    if transactions.is_empty() {
        println!("No transactions yet.");
        return;
    }
    println!(
        "{:<16}  {:<10} {:>14} {:>10}  {:<8} PAYMENT",
        "DATE", "PLAN", "AMOUNT", "CREDITS", "STATUS"
    );
    for tx in transactions {
        println!(
            "{:<16}  {:<10} {:>14} {:>10}  {:<8} {}",
            format_timestamp(tx.transactions_date),
            tx.plan_id,
            format_amount(tx.amount, tx.currency.as_deref().unwrap_or("INR")),
            tx.credits_added,
            tx.status.as_deref().unwrap_or("-"),
            tx.payment_id.as_deref().unwrap_or("-")
        );
    }
}
