use std::io::Write;

use notes_client::{
    auth::{Credentials, HttpAuthProvider},
    config,
    gateway::{HttpGateway, PublicNotes},
    logging,
    notes::{Applied, Completion, DeleteConfirmation, Note, NoteId, NotesApp, Pending, ViewState},
    session::{FileCredentialStore, Session, SessionController},
    Error, Result,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::mpsc::{self, UnboundedSender},
};

type Input = Lines<BufReader<Stdin>>;

enum Exit {
    Quit,
    Logout,
    Expired(Error),
}

enum Step {
    Continue,
    Confirm(DeleteConfirmation),
    Exit(Exit),
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = config()?;
    logging::setup_tracing(config.log_json);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut sessions = SessionController::new(FileCredentialStore::new(&config.credential_file));
    let auth = HttpAuthProvider::new(&config.api_url, config.request_timeout())?;
    let public = PublicNotes::new(&config.api_url, config.request_timeout())?;

    tracing::info!(api_url = %config.api_url, "starting notes client");

    loop {
        let session = match sessions.resume() {
            Ok(session) => session,
            Err(Error::Unauthorized) => match authenticate(&auth, &mut input).await? {
                Some(session) => sessions.sign_in(session)?,
                None => return Ok(()),
            },
            Err(error) => return Err(error),
        };

        let gateway = HttpGateway::new(&config.api_url, session, config.request_timeout())?;
        match run_notes(NotesApp::new(gateway), &public, &mut input).await? {
            Exit::Quit => return Ok(()),
            Exit::Logout => sessions.logout()?,
            Exit::Expired(error) => {
                sessions.handle_error(&error)?;
                println!("Your session has expired. Please log in again.");
            }
        }
    }
}

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

/// Asks for credentials until the user signs in or gives up.
async fn authenticate(auth: &HttpAuthProvider, input: &mut Input) -> Result<Option<Session>> {
    loop {
        let Some(choice) = prompt(input, "[l]ogin, [r]egister or [q]uit: ").await? else {
            return Ok(None);
        };
        let register = match choice.trim() {
            "l" | "login" => false,
            "r" | "register" => true,
            "q" | "quit" => return Ok(None),
            _ => continue,
        };

        let Some(email) = prompt(input, "email: ").await? else {
            return Ok(None);
        };
        let Some(password) = prompt(input, "password: ").await? else {
            return Ok(None);
        };
        let credentials = Credentials::new(email.trim(), password);

        let result = if register {
            let Some(confirm) = prompt(input, "confirm password: ").await? else {
                return Ok(None);
            };
            auth.register(&credentials, &confirm).await
        } else {
            auth.login(&credentials).await
        };

        match result {
            Ok(session) => return Ok(Some(session)),
            Err(error) => report(&error),
        }
    }
}

fn spawn(tx: &UnboundedSender<Completion>, pending: Pending<HttpGateway>) {
    tracing::debug!(operation = %pending.describe(), "issued");
    let tx = tx.clone();
    tokio::spawn(async move {
        tx.send(pending.run().await).ok();
    });
}

/// Command loop for one authenticated session. Gateway calls run in the
/// background; their results are applied here as they come in.
async fn run_notes(mut app: NotesApp<HttpGateway>, public: &PublicNotes, input: &mut Input) -> Result<Exit> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let mut confirmation: Option<DeleteConfirmation> = None;

    println!("Loading notes...");
    spawn(&tx, app.load()?);
    print_help();

    loop {
        tokio::select! {
            Some(completion) = rx.recv() => match app.apply(completion) {
                Ok(applied) => render_applied(&app, &applied),
                Err(error) if error.is_unauthorized() => return Ok(Exit::Expired(error)),
                Err(error) => {
                    match app.error() {
                        Some(message) => println!("{message}"),
                        None => report(&error),
                    }
                    app.dismiss_error();
                }
            },
            line = input.next_line() => {
                let Some(line) = line? else {
                    return Ok(Exit::Quit);
                };

                if let Some(pending_delete) = confirmation.take() {
                    if line.trim().eq_ignore_ascii_case("y") {
                        match app.confirm_delete(pending_delete) {
                            Ok(pending) => spawn(&tx, pending),
                            Err(error) => report(&error),
                        }
                    } else {
                        println!("Delete cancelled");
                    }
                    continue;
                }

                match command(&mut app, public, &tx, &line).await {
                    Ok(Step::Continue) => {}
                    Ok(Step::Confirm(pending_delete)) => {
                        println!("{} [y/N]", pending_delete.prompt());
                        confirmation = Some(pending_delete);
                    }
                    Ok(Step::Exit(exit)) => return Ok(exit),
                    Err(error) => report(&error),
                }
            }
        }
    }
}

async fn command(
    app: &mut NotesApp<HttpGateway>,
    public: &PublicNotes,
    tx: &UnboundedSender<Completion>,
    line: &str,
) -> Result<Step> {
    let line = line.trim();
    let (name, arg) = line.split_once(' ').map_or((line, ""), |(n, a)| (n, a.trim()));

    match name {
        "" => {}
        "help" => print_help(),
        "list" => print_list(app),
        "search" => {
            app.set_query(arg);
            print_list(app);
        }
        "select" => {
            app.select(parse_id(arg)?)?;
            print_view(app.view());
        }
        "show" => print_view(app.view()),
        "new" => {
            app.start_creating()?;
            println!("Creating a new note. Use `title`, `content`, then `save`.");
        }
        "edit" => {
            app.start_editing()?;
            print_view(app.view());
        }
        "title" => app.set_title(arg)?,
        "content" => app.set_content(arg)?,
        "save" => spawn(tx, app.save()?),
        "cancel" => {
            app.cancel()?;
            print_view(app.view());
        }
        "delete" => {
            let id = selected_or(app, arg)?;
            return Ok(Step::Confirm(app.request_delete(id)?));
        }
        "share" => {
            let pending = match arg {
                "" => app.share_selected()?,
                arg => app.share(parse_id(arg)?)?,
            };
            spawn(tx, pending);
        }
        "public" => print_note(&public.fetch(arg).await?),
        "reload" => spawn(tx, app.load()?),
        "logout" => return Ok(Step::Exit(Exit::Logout)),
        "quit" | "exit" => return Ok(Step::Exit(Exit::Quit)),
        other => println!("unknown command `{other}`, try `help`"),
    }

    Ok(Step::Continue)
}

fn parse_id(arg: &str) -> Result<NoteId> {
    arg.parse()
        .map_err(|_| Error::validation(format!("`{arg}` is not a note id")))
}

fn selected_or(app: &NotesApp<HttpGateway>, arg: &str) -> Result<NoteId> {
    match arg {
        "" => app
            .view()
            .selected_id()
            .ok_or_else(|| Error::validation("select a note or pass its id")),
        arg => parse_id(arg),
    }
}

fn report(error: &Error) {
    match error {
        Error::Validation(message) | Error::NotFound(message) => println!("{message}"),
        error => println!("error: {error}"),
    }
}

fn render_applied(app: &NotesApp<HttpGateway>, applied: &Applied) {
    match applied {
        Applied::Loaded(_) => print_list(app),
        Applied::Created(id) => println!("Created note {id}"),
        Applied::Updated(id) => println!("Saved note {id}"),
        Applied::Deleted(id) => println!("Deleted note {id}"),
        Applied::Shared { id, link } => println!("Note {id} is shared at {link}"),
    }
    if matches!(applied, Applied::Created(_) | Applied::Updated(_)) {
        print_view(app.view());
    }
}

fn print_help() {
    println!(
        "commands: list, search <q>, select <id>, show, new, edit, title <text>, content <text>, \
         save, cancel, delete [id], share [id], public <link>, reload, logout, quit"
    );
}

fn print_list(app: &NotesApp<HttpGateway>) {
    let notes = app.visible();
    if notes.is_empty() {
        println!("No notes found.");
        return;
    }

    let selected = app.view().selected_id();
    for note in notes {
        let marker = if Some(note.id) == selected { '>' } else { ' ' };
        let preview: String = note.content.chars().take(60).collect();
        println!("{marker} {:>4}  {}  {}", note.id, note.title, preview.replace('\n', " "));
    }
}

fn print_note(note: &Note) {
    println!("# {}", note.title);
    if let Some(updated_at) = note.updated_at {
        println!("Last updated: {}", updated_at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(link) = &note.share_link {
        println!("Shared at: {link}");
    }
    println!("\n{}", note.content);
}

fn print_view(view: &ViewState) {
    match view {
        ViewState::Idle => println!("No note selected. Choose one from the list or create a new one."),
        ViewState::Viewing(note) => print_note(note),
        ViewState::Creating { draft, .. } => {
            println!("Create New Note\ntitle: {}\ncontent: {}", draft.title, draft.content)
        }
        ViewState::Editing { note, draft, .. } => {
            println!("Edit Note {}\ntitle: {}\ncontent: {}", note.id, draft.title, draft.content)
        }
    }
}
