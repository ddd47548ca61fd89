//! Command-line client for the Thetawaves server.
//!
//! Signs in (or signs up), keeps the session in a local file, and manages the
//! signed-in user's song list from a prompt.

use anyhow::{Context, Result};
use pico_args::Arguments;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tw_client::{
    api_client::ApiClient,
    commands::{COMMAND_HELP, Command, parse_command},
    session_store::{SessionStore, StoredSession, sign_out},
};

const HELP: &str = "\
Manage your Thetawaves song list

USAGE:
  tw_client [OPTIONS]

OPTIONS:
  --server URL          Server URL  [default: http://localhost:5001]
  --session PATH        Session file  [default: <config dir>/thetawaves/session.json]
  --username NAME       Username for signin or signup
  --password PASS       Password (prompted when omitted)
  --email EMAIL         Email for signup

FLAGS:
  --signup              Create an account instead of signing in
  --logout              Sign out, remove the session file and exit
  -h, --help            Print help information
";

struct Args {
    server_url: String,
    session_path: PathBuf,
    username: Option<String>,
    password: Option<String>,
    email: Option<String>,
    signup: bool,
    logout: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server_url: pargs
            .opt_value_from_str("--server")?
            .unwrap_or_else(|| "http://localhost:5001".to_string()),
        session_path: pargs
            .opt_value_from_str("--session")?
            .unwrap_or_else(SessionStore::default_path),
        username: pargs.opt_value_from_str("--username")?,
        password: pargs.opt_value_from_str("--password")?,
        email: pargs.opt_value_from_str("--email")?,
        signup: pargs.contains("--signup"),
        logout: pargs.contains("--logout"),
    };

    run(args).await
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

async fn logout(client: &mut ApiClient, store: &SessionStore) -> Result<()> {
    let message = sign_out(client, store).await?;
    println!("{message}");
    Ok(())
}

/// Reuse the stored session when the server still accepts it
async fn resume(args: &Args, store: &SessionStore) -> Result<Option<ApiClient>> {
    if args.signup || args.username.is_some() {
        return Ok(None);
    }
    let Some(session) = store.load()? else {
        return Ok(None);
    };

    let client = ApiClient::new(args.server_url.clone()).with_token(session.token);
    match client.me().await {
        Ok(user) => {
            println!("Signed in as {} <{}>", user.username, user.email);
            Ok(Some(client))
        }
        Err(e) => {
            println!("Stored session no longer valid ({e}); please sign in again.");
            store.clear()?;
            Ok(None)
        }
    }
}

async fn authenticate(args: &Args, store: &SessionStore) -> Result<ApiClient> {
    let mut client = ApiClient::new(args.server_url.clone());

    let username = match &args.username {
        Some(u) => u.clone(),
        None => prompt("Username")?,
    };
    let password = match &args.password {
        Some(p) => p.clone(),
        None => prompt("Password")?,
    };

    let success = if args.signup {
        let email = match &args.email {
            Some(e) => e.clone(),
            None => prompt("Email")?,
        };
        client.signup(&email, &username, &password).await?
    } else {
        client.signin(&username, &password).await?
    };

    println!("{}", success.message);
    store.save(&StoredSession::from(success))?;
    Ok(client)
}

async fn run(args: Args) -> Result<()> {
    let store = SessionStore::new(args.session_path.clone());

    if args.logout {
        let mut client = ApiClient::new(args.server_url.clone());
        if let Some(session) = store.load()? {
            client = client.with_token(session.token);
        }
        return logout(&mut client, &store).await;
    }

    let mut client = match resume(&args, &store).await? {
        Some(client) => client,
        None => authenticate(&args, &store).await?,
    };

    println!("Type 'help' for commands.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("Failed to read input")? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let result = match command {
            Command::List => client.list_songs().await.map(|songs| {
                if songs.is_empty() {
                    println!("No songs yet.");
                }
                for (i, song) in songs.iter().enumerate() {
                    println!("  {i}. {song}");
                }
            }),
            Command::Add(title) => client.add_song(&title).await,
            Command::Set { index, title } => client.replace_song(index, &title).await,
            Command::Remove(index) => client.remove_song(index).await,
            Command::WhoAmI => client
                .me()
                .await
                .map(|user| println!("{} <{}> ({})", user.username, user.email, user.id)),
            Command::Logout => {
                logout(&mut client, &store).await?;
                break;
            }
            Command::Help => {
                println!("{COMMAND_HELP}");
                Ok(())
            }
            Command::Quit => break,
        };

        if let Err(e) = result {
            println!("{e}");
        }
    }

    Ok(())
}
