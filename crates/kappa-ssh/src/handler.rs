//! Per-connection SSH handler: authentication, channels, and the REPL.
//!
//! Each accepted connection gets one [`Connection`] value. Authentication is
//! public-key only, against the user store. `session` channels run the
//! interactive REPL; the `kappa-client` subsystem runs the programmatic
//! statement-per-line mode.

use crate::executor::Executor;
use crate::messages;
use crate::session::Session;
use crate::terminal::{Terminal, TerminalEvent, DEFAULT_PROMPT};
use crate::writer::{ResponseWriter, DEFAULT_COLORS};
use kappa_commons::UserName;
use kappa_datamodel::{marshal_public_key, System, User};
use kappa_skl::parse_statement;
use log::{debug, info, warn};
use russh::keys::PublicKey;
use russh::server::{Auth, Handler, Msg, Session as SshSession};
use russh::{Channel, ChannelId, CryptoVec};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Subsystem name for the programmatic statement channel.
pub const CLIENT_SUBSYSTEM: &str = "kappa-client";

/// Resolves the announced username and offered key against the user store.
///
/// The username must belong to a stored user and the key must be present in
/// that user's key ring. No password or `none` fallback.
pub(crate) fn authenticate(system: &System, username: &str, key: &PublicKey) -> Option<User> {
    let account = system.users().get(&UserName::new(username)).ok()?;
    let blob = marshal_public_key(key).ok()?;
    match account.key_ring().contains(&blob) {
        Ok(true) => Some(account),
        _ => None,
    }
}

fn log_auth_success(user: &str, method: &str) {
    info!(target: "kappa::auth", "successful login user={} method={}", user, method);
}

fn log_auth_failure(user: &str, method: &str, error: &str) {
    info!(target: "kappa::auth", "login attempt user={} method={} error={}", user, method, error);
}

/// State of one accepted channel.
enum ChannelMode {
    /// Session channel opened, no pty or subsystem yet.
    Open,
    Shell(ShellState),
    Client(ClientState),
}

struct ShellState {
    terminal: Terminal,
    executor: Executor,
    started: bool,
}

impl ShellState {
    fn new(user: User, system: System) -> Self {
        Self {
            terminal: Terminal::new(DEFAULT_PROMPT),
            executor: Executor::new(Session::new(Some(user)), system),
            started: false,
        }
    }
}

struct ClientState {
    buf: Vec<u8>,
    // Prompt state exists only because USE updates it; nothing reads it here.
    terminal: Terminal,
    executor: Executor,
}

impl ClientState {
    fn new(user: User, system: System) -> Self {
        Self {
            buf: Vec::new(),
            terminal: Terminal::new(DEFAULT_PROMPT),
            executor: Executor::new(Session::new(Some(user)), system),
        }
    }
}

/// Handler for one SSH connection.
pub struct Connection {
    system: System,
    peer: Option<SocketAddr>,
    user: Option<User>,
    channels: HashMap<ChannelId, ChannelMode>,
}

impl Connection {
    pub fn new(system: System, peer: Option<SocketAddr>) -> Self {
        Self {
            system,
            peer,
            user: None,
            channels: HashMap::new(),
        }
    }

    /// Moves an `Open` channel into shell mode. Idempotent.
    fn ensure_shell(&mut self, id: ChannelId) -> bool {
        let Some(user) = self.user.clone() else {
            return false;
        };
        match self.channels.get_mut(&id) {
            Some(mode @ ChannelMode::Open) => {
                *mode = ChannelMode::Shell(ShellState::new(user, self.system.clone()));
                true
            }
            Some(ChannelMode::Shell(_)) => true,
            _ => false,
        }
    }
}

fn send(session: &mut SshSession, id: ChannelId, bytes: &[u8]) {
    if !bytes.is_empty() {
        let _ = session.data(id, CryptoVec::from_slice(bytes));
    }
}

/// Banner, login message, and the first prompt.
fn greeting(state: &Terminal) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"\r\n");
    for line in messages::ASCII {
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n\n");
    messages::login_message(&mut out, &DEFAULT_COLORS);
    out.extend_from_slice(b"\n");
    state.write_prompt(&mut out);
    out
}

/// Runs one completed REPL line. Returns false when the channel should
/// close.
fn process_shell_line(state: &mut ShellState, input: &str, out: &mut Vec<u8>) -> bool {
    let line = input.trim();
    if line.is_empty() {
        state.terminal.write_prompt(out);
        return true;
    }

    if line == "exit" || line == "quit" {
        info!("closing connection");
        return false;
    }

    if line == "quote me" {
        out.extend_from_slice(b"\r\n");
        messages::login_message(out, &DEFAULT_COLORS);
        out.extend_from_slice(b"\r\n");
        state.terminal.write_prompt(out);
        return true;
    }

    // Comments echo dimly and are never parsed.
    if line.starts_with("//") || line.starts_with("--") {
        out.extend_from_slice(DEFAULT_COLORS.light_grey);
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(DEFAULT_COLORS.reset);
        state.terminal.write_prompt(out);
        return true;
    }

    match parse_statement(line) {
        Err(err) => {
            warn!("bad statement statement={:?} error={}", line, err);
            out.extend_from_slice(DEFAULT_COLORS.light_red);
            out.extend_from_slice(err.to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(DEFAULT_COLORS.reset);
            state.terminal.write_prompt(out);
        }
        Ok(stmt) => {
            {
                let mut writer = ResponseWriter::new(DEFAULT_COLORS, &mut *out);
                state
                    .executor
                    .execute(&mut writer, &mut state.terminal, &stmt);
            }
            state.terminal.write_prompt(out);
        }
    }
    true
}

/// Feeds shell input through the line editor and the REPL. Returns false
/// when the channel should close.
fn shell_data(state: &mut ShellState, id: ChannelId, data: &[u8], session: &mut SshSession) -> bool {
    let mut out = Vec::new();
    let events = state.terminal.feed(data, &mut out);

    for event in events {
        let keep_open = match event {
            TerminalEvent::Eof => false,
            TerminalEvent::Line(input) => process_shell_line(state, &input, &mut out),
        };
        if !keep_open {
            send(session, id, &out);
            return false;
        }
    }

    send(session, id, &out);
    true
}

/// Programmatic mode: every newline-terminated chunk is one SKL statement.
fn client_data(state: &mut ClientState, id: ChannelId, data: &[u8], session: &mut SshSession) {
    state.buf.extend_from_slice(data);

    let mut out = Vec::new();
    while let Some(newline) = state.buf.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = state.buf.drain(..=newline).collect();
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_statement(line) {
            Err(err) => {
                out.extend_from_slice(DEFAULT_COLORS.light_red);
                out.extend_from_slice(err.to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(DEFAULT_COLORS.reset);
            }
            Ok(stmt) => {
                let mut writer = ResponseWriter::new(DEFAULT_COLORS, &mut out);
                state
                    .executor
                    .execute(&mut writer, &mut state.terminal, &stmt);
            }
        }
    }

    send(session, id, &out);
}

impl Handler for Connection {
    type Error = russh::Error;

    async fn auth_publickey(
        &mut self,
        user: &str,
        public_key: &PublicKey,
    ) -> Result<Auth, Self::Error> {
        match authenticate(&self.system, user, public_key) {
            Some(account) => {
                log_auth_success(user, "publickey");
                self.user = Some(account);
                Ok(Auth::Accept)
            }
            None => {
                log_auth_failure(user, "publickey", "invalid user or public key");
                Ok(Auth::Reject {
                    proceed_with_methods: None,
                })
            }
        }
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut SshSession,
    ) -> Result<bool, Self::Error> {
        if self.user.is_none() {
            return Ok(false);
        }
        debug!(
            "session channel opened id={:?} peer={:?}",
            channel.id(),
            self.peer
        );
        self.channels.insert(channel.id(), ChannelMode::Open);
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        _term: &str,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(russh::Pty, u32)],
        session: &mut SshSession,
    ) -> Result<(), Self::Error> {
        if !self.ensure_shell(channel) {
            let _ = session.channel_failure(channel);
            return Ok(());
        }
        let _ = session.channel_success(channel);

        if let Some(ChannelMode::Shell(state)) = self.channels.get_mut(&channel) {
            if !state.started {
                state.started = true;
                let banner = greeting(&state.terminal);
                send(session, channel, &banner);
            }
        }
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut SshSession,
    ) -> Result<(), Self::Error> {
        if !self.ensure_shell(channel) {
            let _ = session.channel_failure(channel);
            return Ok(());
        }
        let _ = session.channel_success(channel);

        if let Some(ChannelMode::Shell(state)) = self.channels.get_mut(&channel) {
            if !state.started {
                state.started = true;
                let banner = greeting(&state.terminal);
                send(session, channel, &banner);
            }
        }
        Ok(())
    }

    /// Commands are not accepted, only the default shell.
    async fn exec_request(
        &mut self,
        channel: ChannelId,
        _data: &[u8],
        session: &mut SshSession,
    ) -> Result<(), Self::Error> {
        let _ = session.channel_failure(channel);
        Ok(())
    }

    async fn env_request(
        &mut self,
        channel: ChannelId,
        _variable_name: &str,
        _variable_value: &str,
        session: &mut SshSession,
    ) -> Result<(), Self::Error> {
        let _ = session.channel_failure(channel);
        Ok(())
    }

    async fn subsystem_request(
        &mut self,
        channel: ChannelId,
        name: &str,
        session: &mut SshSession,
    ) -> Result<(), Self::Error> {
        let user = self.user.clone();
        match (name, self.channels.get_mut(&channel), user) {
            (CLIENT_SUBSYSTEM, Some(mode @ ChannelMode::Open), Some(user)) => {
                *mode = ChannelMode::Client(ClientState::new(user, self.system.clone()));
                let _ = session.channel_success(channel);
            }
            _ => {
                info!("unknown subsystem name={}", name);
                let _ = session.channel_failure(channel);
            }
        }
        Ok(())
    }

    async fn data(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut SshSession,
    ) -> Result<(), Self::Error> {
        let keep_open = match self.channels.get_mut(&channel) {
            Some(ChannelMode::Shell(state)) => shell_data(state, channel, data, session),
            Some(ChannelMode::Client(state)) => {
                client_data(state, channel, data, session);
                true
            }
            _ => true,
        };

        if !keep_open {
            self.channels.remove(&channel);
            let _ = session.eof(channel);
            let _ = session.close(channel);
        }
        Ok(())
    }

    async fn channel_close(
        &mut self,
        channel: ChannelId,
        _session: &mut SshSession,
    ) -> Result<(), Self::Error> {
        self.channels.remove(&channel);
        Ok(())
    }
}
