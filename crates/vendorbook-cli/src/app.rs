//! Screen logic for the command-line front end.
//!
//! `App` owns the session client and the provider. Every command restores
//! the stored session first, then runs inside the provider scope and reaches
//! the session only through `use_session()`, the same way a screen would.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{debug, warn};
use vendorbook_core::auth::SessionClient;
use vendorbook_core::models::{MenuItemForm, ProfileUpdate, User};
use vendorbook_core::{use_session, Config, SessionProvider, SignupForm};

use crate::prompt;
use crate::Command;

pub struct App {
    config: Config,
    client: Arc<SessionClient>,
    provider: SessionProvider,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let client = Arc::new(SessionClient::from_config(&config)?);
        let provider = SessionProvider::new(client.clone());
        Ok(Self {
            config,
            client,
            provider,
        })
    }

    pub async fn run(self, command: Command) -> Result<()> {
        let App {
            mut config,
            client,
            provider,
        } = self;

        if let Some(user) = client.restore_session().await {
            debug!(user_id = %user.id, "Restored session");
        }

        let result = provider.scope(dispatch(&mut config, command)).await;

        let root = active_root(&provider);
        println!("Active screen stack: {:?}", root);

        provider.shutdown();
        result
    }
}

fn active_root(provider: &SessionProvider) -> vendorbook_core::NavigationRoot {
    provider.context().gate().current()
}

async fn dispatch(config: &mut Config, command: Command) -> Result<()> {
    match command {
        Command::Login { email } => login(config, email).await,
        Command::Signup => signup().await,
        Command::Logout => {
            use_session().logout().await;
            println!("Signed out.");
            Ok(())
        }
        Command::Status => status(),
        Command::Profile => {
            require_session()?;
            let user = use_session().api().current_user().await?;
            print_user(&user);
            Ok(())
        }
        Command::Profiles => {
            require_session()?;
            for user in use_session().api().all_profiles().await? {
                print_user(&user);
            }
            Ok(())
        }
        Command::UpdateProfile { name, email, phone } => {
            require_session()?;
            let update = ProfileUpdate {
                name,
                email,
                phone,
                ..Default::default()
            };
            let user = use_session().api().update_profile(&update).await?;
            println!("Profile updated.");
            print_user(&user);
            Ok(())
        }
        Command::Menus { vendor } => {
            require_session()?;
            let menus = use_session().api().list_menus(vendor.as_deref()).await?;
            if menus.is_empty() {
                println!("No menu items.");
            }
            for item in menus {
                println!(
                    "{:<12} {:<24} {:>9}  {:<11} {:?}",
                    item.id,
                    item.name,
                    item.price_display(),
                    item.category,
                    item.status
                );
            }
            Ok(())
        }
        Command::MenuAdd {
            name,
            price,
            category,
            description,
            image,
        } => {
            require_session()?;
            let form = MenuItemForm {
                name,
                description,
                price,
                category,
                image,
            };
            let item = form.validate()?;
            let created = use_session().api().create_menu(&item).await?;
            println!("Added {} ({}).", created.name, created.id);
            Ok(())
        }
        Command::MenuToggle { id } => {
            require_session()?;
            let api = use_session().api().clone();
            let item = api.menu(&id).await?;
            let updated = api.update_menu(&id, &item.toggle_visibility()).await?;
            println!("{} is now {:?}.", updated.name, updated.status);
            Ok(())
        }
        Command::MenuDelete { id } => {
            require_session()?;
            use_session().api().delete_menu(&id).await?;
            println!("Deleted {}.", id);
            Ok(())
        }
    }
}

fn require_session() -> Result<()> {
    let ctx = use_session();
    if ctx.session().is_authenticated() {
        Ok(())
    } else {
        match ctx.error() {
            Some(message) => bail!("{} Run `vendorbook login`.", message),
            None => bail!("Not signed in. Run `vendorbook login`."),
        }
    }
}

async fn login(config: &mut Config, email: Option<String>) -> Result<()> {
    let ctx = use_session();
    let email = match email {
        Some(email) => email,
        None => prompt::line("Email", config.last_email.as_deref())?,
    };
    let password = prompt::password("Password")?;

    let user = ctx.login(&email, &password).await?;
    println!("Welcome back, {}!", user.display_name());

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    Ok(())
}

async fn signup() -> Result<()> {
    let ctx = use_session();
    let form = SignupForm {
        name: prompt::line("Full name", None)?,
        cnic_number: prompt::line("CNIC number", None)?,
        email: prompt::line("Email", None)?,
        password: prompt::password("Password")?,
    };
    let confirm = prompt::password("Confirm password")?;
    if confirm != form.password {
        bail!("Passwords do not match");
    }

    let receipt = ctx.signup(&form).await?;
    match receipt.user {
        Some(user) => println!("Signup successful! Welcome, {}.", user.display_name()),
        None => println!("Signup successful!"),
    }
    if let Some(message) = receipt.message {
        println!("{}", message);
    }
    println!("Check your email for a verification link, then run `vendorbook login`.");
    Ok(())
}

fn status() -> Result<()> {
    let ctx = use_session();
    let session = ctx.session();
    println!("Status: {:?}", session.status());
    if let Some(user) = session.user() {
        print_user(user);
    }
    if let Some(at) = session.authenticated_at() {
        println!("Signed in at: {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
    if let Some(error) = session.last_error() {
        println!("Last error: {}", error);
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("{} <{}> (id {})", user.display_name(), user.email, user.id);
    if let Some(ref phone) = user.phone {
        println!("  phone: {}", phone);
    }
    if let Some(ref cnic) = user.cnic_number {
        println!("  cnic:  {}", cnic);
    }
}
