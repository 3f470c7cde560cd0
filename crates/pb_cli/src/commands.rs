//! Subcommand handlers.
//!
//! # Responsibility
//! - Gather missing input (category, subject, body) from the user.
//! - Call into [`ItemService`] and render its results.

use crate::editor;
use crate::prompt;
use anyhow::{Context, Result};
use clap::Args;
use pb_core::resolve::priority::{self, priority_choices};
use pb_core::{
    AddItemRequest, AmbiguityPolicy, Item, ItemService, ListedItem, MatchError, PriorityError,
    ServiceError, ShownContainer,
};
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Priority name, abbreviation or rank (1 = highest)
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Override the author email
    #[arg(short = 'm', long)]
    pub email: Option<String>,

    /// Override the author name
    #[arg(short = 'u', long = "user")]
    pub name: Option<String>,

    /// Override the recorded revision
    #[arg(short, long)]
    pub revision: Option<String>,

    /// Store the subject as the body instead of asking for one
    #[arg(short = 'n', long = "no-message")]
    pub no_message: bool,

    /// Editor command for composing the body
    #[arg(short, long)]
    pub editor: Option<String>,

    /// Category (abbreviations allowed)
    pub category: Option<String>,

    /// Subject words
    #[arg(trailing_var_arg = true)]
    pub subject: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Include the done category
    #[arg(short, long)]
    pub all: bool,

    /// Print items as JSON
    #[arg(long)]
    pub json: bool,

    /// Terms that must all appear in subject or body (case-insensitive)
    pub terms: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ItemArgs {
    /// Item id (file name prefix) or message id prefix
    pub item: String,
}

pub fn add(service: &mut ItemService<'_>, args: AddArgs) -> Result<()> {
    let known = service.known_categories();
    let category = prompt::choose("category", args.category.as_deref(), &known)?;
    let priority = args
        .priority
        .as_deref()
        .map(resolve_priority)
        .transpose()?;

    let subject = match args.subject.join(" ").trim() {
        "" => prompt::input("Subject")?,
        joined => joined.to_string(),
    };

    let body = if args.no_message {
        format!("{subject}\n")
    } else if !prompt::is_interactive() {
        editor::read_stdin()?
    } else {
        let editor = args
            .editor
            .clone()
            .unwrap_or_else(|| service.config().editor_command());
        let hint = format!("Adding to {category}: {subject}");
        editor::compose(&editor, &[hint.as_str()])?
    };

    let added = service.add_item(&AddItemRequest {
        category,
        subject,
        body,
        priority,
        name: args.name,
        email: args.email,
        revision: args.revision,
        created_at: None,
        policy: AmbiguityPolicy::Fail,
    })?;
    println!("Added {}", added.relative_path.display());
    Ok(())
}

pub fn list(service: &mut ItemService<'_>, args: ListArgs) -> Result<()> {
    let listed = service.list_items(&args.terms, args.all)?;
    let mut out = io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &listed).context("failed to encode items")?;
        writeln!(out)?;
    } else {
        for entry in &listed {
            writeln!(out, "{}", list_line(entry))?;
        }
    }
    Ok(())
}

pub fn show(service: &mut ItemService<'_>, args: ItemArgs) -> Result<()> {
    let shown = with_item_choice(&args.item, |token| service.show_item(token))?;
    let mut out = io::stdout().lock();
    write_container(&mut out, &shown)?;
    Ok(())
}

pub fn close(service: &mut ItemService<'_>, args: ItemArgs) -> Result<()> {
    let closed = with_item_choice(&args.item, |token| service.close_item(token))?;
    println!(
        "Closed {}/{} -> {}",
        closed.from.category,
        closed.from.stem(),
        closed.to.display()
    );
    Ok(())
}

/// Runs `op`, letting the user pick when the token matches several items.
fn with_item_choice<T>(
    token: &str,
    mut op: impl FnMut(&str) -> Result<T, ServiceError>,
) -> Result<T> {
    match op(token) {
        Err(ServiceError::AmbiguousItem { candidates, .. }) if prompt::is_interactive() => {
            let picked = prompt::select(&format!("`{token}` matches several items"), &candidates)?;
            let stem = picked.rsplit('/').next().unwrap_or(picked.as_str());
            Ok(op(stem)?)
        }
        other => Ok(other?),
    }
}

fn resolve_priority(token: &str) -> Result<String> {
    match priority::resolve(token, AmbiguityPolicy::Fail) {
        Ok(priority) => Ok(priority.name().to_string()),
        Err(PriorityError::Ambiguous(MatchError::Ambiguous { candidates, .. }))
            if prompt::is_interactive() =>
        {
            prompt::select(&format!("`{token}` is ambiguous; pick a priority"), &candidates)
        }
        Err(err) => Err(err).with_context(|| {
            format!("accepted priorities: {}", priority_choices().join(", "))
        }),
    }
}

fn list_line(entry: &ListedItem) -> String {
    let mut line = format!(
        "{:<7}  {:<9} {}  {}",
        entry.item.priority.display_name(),
        entry.category,
        entry.id,
        entry.item.subject
    );
    if entry.messages > 1 {
        line.push_str(&format!(" (+{})", entry.messages - 1));
    }
    line
}

fn write_container(out: &mut impl Write, shown: &ShownContainer) -> io::Result<()> {
    writeln!(
        out,
        "{}/{}",
        shown.container.category,
        shown.container.stem()
    )?;
    for item in &shown.items {
        writeln!(out)?;
        write_item(out, item)?;
    }
    Ok(())
}

fn write_item(out: &mut impl Write, item: &Item) -> io::Result<()> {
    writeln!(out, "Subject: {}", item.subject)?;
    writeln!(out, "From: {}", item.author())?;
    writeln!(out, "Date: {}", item.created_at.to_rfc2822())?;
    writeln!(out, "Priority: {}", item.priority.header_value())?;
    if let Some(revision) = &item.revision {
        writeln!(out, "Revision: {revision}")?;
    }
    writeln!(out, "Message-ID: {}", item.message_id)?;
    if !item.body.is_empty() {
        writeln!(out)?;
        write!(out, "{}", item.body)?;
        if !item.body.ends_with('\n') {
            writeln!(out)?;
        }
    }
    Ok(())
}
