//! Account and session commands: register, login, logout, whoami and
//! profile rename.

use serde::Serialize;

use crate::cli::{required_text, GlobalOptions};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::user::User;

pub struct RegisterOptions {
    pub email: String,
    pub name: String,
    pub password: String,
}

pub struct LoginOptions {
    pub email: String,
    pub password: String,
}

pub struct RenameOptions {
    pub name: String,
}

#[derive(Serialize)]
struct SessionReport {
    authenticated: bool,
    user: Option<User>,
}

pub fn run_register(options: RegisterOptions, global: &GlobalOptions) -> Result<()> {
    let email = required_text("email", &options.email)?;
    if !email.contains('@') {
        return Err(Error::InvalidArgument(format!(
            "'{email}' does not look like an email address"
        )));
    }
    let name = required_text("name", &options.name)?;
    if options.password.is_empty() {
        return Err(Error::InvalidArgument("password must not be empty".to_string()));
    }

    let app = global.open_app()?;
    let user = app.register(&email, &name, &options.password)?;

    let mut human = HumanOutput::new(format!("tb register: created {}", user.email));
    push_user_summary(&mut human, &user);
    human.push_next_step(format!("tb login {}", user.email));

    emit_success(global.output(), "register", &user, Some(&human))
}

pub fn run_login(options: LoginOptions, global: &GlobalOptions) -> Result<()> {
    let email = required_text("email", &options.email)?;
    let mut app = global.open_app()?;
    let user = app.login(&email, &options.password)?;

    let mut human = HumanOutput::new(format!("tb login: welcome, {}", user.name));
    push_user_summary(&mut human, &user);
    human.push_next_step("tb task list");

    let report = SessionReport {
        authenticated: true,
        user: Some(user),
    };
    emit_success(global.output(), "login", &report, Some(&human))
}

pub fn run_logout(global: &GlobalOptions) -> Result<()> {
    let mut app = global.open_app()?;
    let previous = app.current_user().cloned();
    app.logout()?;

    let header = match &previous {
        Some(user) => format!("tb logout: logged out {}", user.email),
        None => "tb logout: no active session".to_string(),
    };
    let human = HumanOutput::new(header);

    let report = SessionReport {
        authenticated: false,
        user: previous,
    };
    emit_success(global.output(), "logout", &report, Some(&human))
}

pub fn run_whoami(global: &GlobalOptions) -> Result<()> {
    let app = global.open_app()?;
    let user = app.current_user().cloned();

    let mut human = match &user {
        Some(user) => {
            let mut human = HumanOutput::new(format!("tb whoami: {}", user.email));
            push_user_summary(&mut human, user);
            human
        }
        None => {
            let mut human = HumanOutput::new("tb whoami: not logged in");
            human.push_next_step("tb login <email>");
            human
        }
    };
    if user.is_some() {
        human.push_next_step("tb stats");
    }

    let report = SessionReport {
        authenticated: user.is_some(),
        user,
    };
    emit_success(global.output(), "whoami", &report, Some(&human))
}

pub fn run_rename(options: RenameOptions, global: &GlobalOptions) -> Result<()> {
    let name = required_text("name", &options.name)?;
    let mut app = global.open_app()?;
    let user = app.rename_current(&name)?;

    let mut human = HumanOutput::new(format!("tb profile rename: now {}", user.name));
    push_user_summary(&mut human, &user);

    emit_success(global.output(), "profile rename", &user, Some(&human))
}

fn push_user_summary(human: &mut HumanOutput, user: &User) {
    human.push_summary("id", user.id.clone());
    human.push_summary("email", user.email.clone());
    human.push_summary("name", user.name.clone());
    human.push_summary("member since", user.created_at.format("%Y-%m-%d").to_string());
}
