//! Operating-system level identity used when no VCS supplies one.

use once_cell::sync::Lazy;

static HOSTNAME: Lazy<String> = Lazy::new(lookup_hostname);

/// Login name of the current user, `"user"` when it cannot be determined.
pub fn login_name() -> String {
    for var in ["USER", "USERNAME", "LOGNAME"] {
        if let Ok(value) = std::env::var(var) {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    passwd_login().unwrap_or_else(|| "user".to_string())
}

/// Display name: the first GECOS field, else the title-cased login.
pub fn full_name() -> String {
    let login = login_name();
    gecos_name(&login).unwrap_or_else(|| title_case_login(&login))
}

/// `$EMAIL`, else `login@hostname`.
pub fn default_email() -> String {
    match std::env::var("EMAIL") {
        Ok(email) if !email.trim().is_empty() => email.trim().to_string(),
        _ => format!("{}@{}", login_name(), hostname()),
    }
}

/// Host name, looked up once per process; `"localhost"` as a last resort.
pub fn hostname() -> &'static str {
    HOSTNAME.as_str()
}

fn title_case_login(login: &str) -> String {
    let mut chars = login.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(unix)]
fn lookup_hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(not(unix))]
fn lookup_hostname() -> String {
    std::env::var("COMPUTERNAME")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(unix)]
fn passwd_login() -> Option<String> {
    let user = nix::unistd::User::from_uid(nix::unistd::Uid::current()).ok()??;
    Some(user.name)
}

#[cfg(not(unix))]
fn passwd_login() -> Option<String> {
    None
}

#[cfg(all(unix, not(any(target_os = "android", target_os = "haiku"))))]
fn gecos_name(login: &str) -> Option<String> {
    let user = nix::unistd::User::from_name(login).ok()??;
    let gecos = user.gecos.into_string().ok()?;
    let name = gecos.split(',').next()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(not(all(unix, not(any(target_os = "android", target_os = "haiku")))))]
fn gecos_name(_login: &str) -> Option<String> {
    None
}
