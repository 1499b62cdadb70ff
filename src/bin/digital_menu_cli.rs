//!
//! digital menu CLI
//! ----------------
//! Drives the session store and catalog from the terminal. Session state persists in a
//! JSON storage file between invocations, so `login` followed by `whoami` behaves like a
//! page reload in the browser client.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use digital_menu::api::{ApiClient, RestAuthService, RestCatalogService};
use digital_menu::catalog::{CatalogService, MenuItemQuery, MockCatalogService};
use digital_menu::config::AppConfig;
use digital_menu::identity::{AuthSync, Credentials, RegistrationData, SessionStore};
use digital_menu::router::{landing_after, RouteGuard};
use digital_menu::storage::{FileStorage, SharedStorage};

const DEFAULT_STORAGE_FILE: &str = ".digital_menu_storage.json";

const USAGE: &str = "digital menu CLI\n\nUSAGE:\n  digital_menu_cli [OPTIONS] <COMMAND>\n\nCOMMANDS:\n  login <email> <password>\n  register <name> <email> <phone> <business_name> <tin> <password>\n  logout\n  whoami\n  menu [page] [search]\n  sync\n\nOPTIONS:\n  --storage PATH   Storage file (env: DIGITAL_MENU_STORAGE_PATH, default .digital_menu_storage.json)\n  --config PATH    JSON config file\n  --remote         Use the REST backend (env: DIGITAL_MENU_API_BASE_URL) instead of demo data\n  -h, --help       Show this help\n";

fn take_opt(args: &mut Vec<String>, flag: &str) -> Option<String> {
    let i = args.iter().position(|a| a == flag)?;
    if i + 1 < args.len() {
        let v = args.remove(i + 1);
        args.remove(i);
        Some(v)
    } else {
        args.remove(i);
        None
    }
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    match args.iter().position(|a| a == flag) {
        Some(i) => { args.remove(i); true }
        None => false,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || take_flag(&mut args, "--help") || take_flag(&mut args, "-h") {
        print!("{}", USAGE);
        return Ok(());
    }

    let config = match take_opt(&mut args, "--config") {
        Some(p) => AppConfig::load(&p)?,
        None => AppConfig::from_env(),
    };
    let remote = take_flag(&mut args, "--remote");
    let storage_path = take_opt(&mut args, "--storage").map(PathBuf::from)
        .or_else(|| config.storage_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_FILE));

    let backend: SharedStorage = Arc::new(
        FileStorage::open(&storage_path).with_context(|| format!("opening storage {}", storage_path.display()))?,
    );
    let sync = AuthSync::new(backend, &config.storage_prefix);
    let store = SessionStore::init(sync.clone(), &config);
    tracing::debug!(storage = %storage_path.display(), remote, "cli started");

    let cmd = args.first().cloned().unwrap_or_default();
    let rest: Vec<String> = args.iter().skip(1).cloned().collect();
    match cmd.as_str() {
        "login" => {
            let [email, password] = rest.as_slice() else { bail!("usage: login <email> <password>") };
            let creds = Credentials { email: email.clone(), password: password.clone(), remember: false };
            if remote {
                let auth = RestAuthService::new(ApiClient::new(&config, sync)?);
                let resp = auth.login(&creds).await?;
                println!("Logged in as {} <{}>", resp.user.name, resp.user.email);
            } else {
                let out = store.login(creds).await?;
                println!("{}", out.message);
                println!("-> {}", landing_after(out.event).path());
            }
        }
        "register" => {
            let [name, email, phone, business_name, tin, password] = rest.as_slice() else {
                bail!("usage: register <name> <email> <phone> <business_name> <tin> <password>")
            };
            let data = RegistrationData {
                name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
                business_name: business_name.clone(),
                tin: tin.clone(),
                password: password.clone(),
                password_confirmation: password.clone(),
            };
            if remote {
                let auth = RestAuthService::new(ApiClient::new(&config, sync)?);
                let resp = auth.register(&data).await?;
                println!("Registered {} (id {})", resp.user.email, resp.user.id);
            } else {
                let out = store.register(data).await?;
                println!("{}", out.message);
                println!("-> {}", landing_after(out.event).path());
            }
        }
        "logout" => {
            if remote {
                if let Err(e) = RestAuthService::new(ApiClient::new(&config, sync)?).logout().await {
                    tracing::warn!(error = %e, "backend logout failed, local session cleared");
                }
            } else {
                store.logout().await;
            }
            println!("Logged out successfully.");
        }
        "whoami" => match store.user() {
            Some(u) => println!("{} <{}>\n{} (TIN {})", u.name, u.email, u.business_name, u.tin),
            None => println!("Not logged in."),
        },
        "menu" => {
            let guard = RouteGuard::new(Arc::clone(&store), &config);
            let nav = guard.before_each("/menu-items").await;
            if !nav.is_allowed() {
                bail!("{} requires a login (redirected to {})", nav.requested.path, nav.target_path());
            }
            let page = rest.first().map(|p| p.parse::<i64>()).transpose().context("page must be a number")?.unwrap_or(1);
            let search = rest.get(1).cloned().unwrap_or_default();
            let service: Arc<dyn CatalogService> = if remote {
                Arc::new(RestCatalogService::new(ApiClient::new(&config, sync)?))
            } else {
                Arc::new(MockCatalogService::seeded())
            };
            let query = MenuItemQuery { per_page: config.items_per_page, ..MenuItemQuery::page(page) }.with_search(search);
            let result = service.list_menu_items(&query).await?;
            println!("{}", guard.title_for(&nav));
            for item in result.data.iter() {
                let category = item.category.as_ref().map(|c| c.name.as_str()).unwrap_or("-");
                println!("{:>4}  {:<24} {:<14} {:>8.2}", item.id, item.item_name, category, item.gross_price());
            }
            let m = &result.meta;
            println!("showing {}-{} of {} (page {}/{})", m.from, m.to, m.total, m.current_page, m.last_page);
        }
        "sync" => {
            if sync.reconcile() { println!("Authentication synced across storage namespaces."); }
            else { println!("No valid session found to sync."); }
        }
        other => {
            eprint!("{}", USAGE);
            bail!("unknown command '{}'", other);
        }
    }
    Ok(())
}
