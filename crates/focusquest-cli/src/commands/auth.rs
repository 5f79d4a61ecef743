use clap::Subcommand;
use focusquest_core::{IdentityProvider, SqliteStore};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account and sign in
    Signup {
        email: String,
        username: String,
        /// At least 6 characters
        #[arg(long)]
        password: String,
    },
    /// Sign in to an existing account
    Signin {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out
    Signout,
    /// Show the signed-in user
    Whoami,
}

pub fn run(action: AuthAction) -> CmdResult {
    let mut store = SqliteStore::open()?;

    match action {
        AuthAction::Signup {
            email,
            username,
            password,
        } => {
            let user = store.sign_up(&email, &password, &username)?;
            print_json(&user)?;
        }
        AuthAction::Signin { email, password } => {
            let user = store.sign_in(&email, &password)?;
            print_json(&user)?;
        }
        AuthAction::Signout => {
            store.sign_out()?;
            println!("signed out");
        }
        AuthAction::Whoami => match store.current_user()? {
            Some(user) => print_json(&user)?,
            None => println!("not signed in"),
        },
    }
    Ok(())
}
