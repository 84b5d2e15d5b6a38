mod config;
mod render;
mod transport;

use std::io::IsTerminal;
use std::rc::Rc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use items_core::{
    Field, HttpItemsApi, ItemFormModal, ItemStatus, ItemsApi, ItemsListView, ItemsPage,
    PaginationController, QueryClient, SubmitBlocked, SubmitOutcome, ToastQueue,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::{Cli, Command, PageArgs};
use transport::UreqTransport;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let init_result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }
}

struct Session {
    api: Rc<dyn ItemsApi>,
    queries: QueryClient<ItemsPage>,
    toasts: Rc<ToastQueue>,
}

impl Session {
    fn open_view(&self, page: &PageArgs) -> ItemsListView {
        let mut view = ItemsListView::new(
            Rc::clone(&self.api),
            self.queries.clone(),
            self.toasts.clone(),
            PaginationController::from_search(&page.search),
        );
        if page.status != view.status() {
            view.toggle_status();
        }
        view.sync();
        view
    }

    fn flush_toasts(&self) {
        for toast in self.toasts.drain() {
            eprintln!("{}", render::toast(&toast));
        }
    }
}

fn run(cli: Cli, session: &Session) -> anyhow::Result<bool> {
    match cli.command {
        Command::List(page) => {
            let view = session.open_view(&page);
            print!("{}", render::table(&view.render()));
            Ok(true)
        }
        Command::Add {
            title,
            description,
            due_date,
        } => {
            let mut form = ItemFormModal::new(
                Rc::clone(&session.api),
                session.queries.clone(),
                session.toasts.clone(),
                || debug!("add item form closed"),
            );
            form.set_value(Field::Title, title);
            form.set_value(Field::Description, description);
            form.set_value(Field::DueDate, due_date);
            match form.submit() {
                SubmitOutcome::Created(item) => {
                    println!("{}", item.id);
                    Ok(true)
                }
                SubmitOutcome::Failed => Ok(false),
                SubmitOutcome::Blocked(SubmitBlocked::Invalid) => {
                    for field in [Field::Title, Field::Description, Field::DueDate] {
                        if let Some(message) = form.error(field) {
                            eprintln!("{}: {message}", field.label());
                        }
                    }
                    Ok(false)
                }
                SubmitOutcome::Blocked(blocked) => Err(blocked.into()),
            }
        }
        Command::Complete { id, page } => {
            if page.status == ItemStatus::Complete {
                bail!("only to-do items can be completed");
            }
            let mut view = session.open_view(&page);
            let item = view
                .item(id)
                .ok_or_else(|| anyhow!("item {id} is not on page {}", view.query().page))?;
            let ok = view.complete_item(&item);
            view.sync();
            print!("{}", render::table(&view.render()));
            Ok(ok)
        }
        Command::Edit { id, edits, page } => {
            let mut view = session.open_view(&page);
            let item = view
                .item(id)
                .ok_or_else(|| anyhow!("item {id} is not on page {}", view.query().page))?;
            let ok = view.edit_item(&edits.apply(&item)?);
            view.sync();
            print!("{}", render::table(&view.render()));
            Ok(ok)
        }
        Command::Delete { id, page } => {
            let mut view = session.open_view(&page);
            if view.item(id).is_none() {
                bail!("item {id} is not on page {}", view.query().page);
            }
            let ok = view.delete_item(id);
            view.sync();
            print!("{}", render::table(&view.render()));
            Ok(ok)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let transport = UreqTransport::new(cli.timeout());
    let session = Session {
        api: Rc::new(HttpItemsApi::new(&cli.api_url, transport)),
        queries: QueryClient::new(cli.query_config()),
        toasts: Rc::new(ToastQueue::new()),
    };
    let api_url = cli.api_url.clone();

    let result = run(cli, &session);
    session.flush_toasts();
    if !result.with_context(|| format!("talking to {api_url}"))? {
        std::process::exit(1);
    }
    Ok(())
}
