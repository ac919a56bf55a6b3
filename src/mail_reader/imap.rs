use anyhow::Result;
use async_imap::{Client, Session};
use chrono::{Days, NaiveDate};
use futures::TryStreamExt;
use itertools::Itertools;
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

use crate::mail_reader::encryption::CredentialStore;
use crate::settings::ImapConfig;
use log::info;

pub type ImapSession = Session<Compat<tokio_native_tls::TlsStream<TcpStream>>>;

// Establish a TLS-encrypted connection to the IMAP server
async fn connect_to_server(server: &str, port: u16) -> Result<tokio_native_tls::TlsStream<TcpStream>> {
    let tcp_stream = TcpStream::connect((server, port)).await?;
    let tls = tokio_native_tls::TlsConnector::from(native_tls::TlsConnector::new()?);
    let tls_stream = tls.connect(server, tcp_stream).await?;

    info!("-- connected to {}:{}", server, port);
    Ok(tls_stream)
}

// Login to the IMAP server and return an authenticated session
async fn login_to_server(
    client: Client<Compat<tokio_native_tls::TlsStream<TcpStream>>>,
    username: &str,
    password: &str,
) -> Result<ImapSession> {
    let imap_session = client
        .login(username, password)
        .await
        .map_err(|e| e.0)?;

    info!("-- logged in as {}", username);
    Ok(imap_session)
}

pub async fn create_session(config: &ImapConfig) -> Result<ImapSession> {
    let credentials = CredentialStore::new(&config.credentials_dir);
    let (username, password) = credentials.get_credentials(&config.username)?;

    let tls_stream = connect_to_server(&config.server, config.port).await?;
    let client = Client::new(tls_stream.compat());
    login_to_server(client, &username, &password).await
}

/// Inclusive date range of messages to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub since: NaiveDate,
    pub until: Option<NaiveDate>,
}

pub fn imap_date(date: NaiveDate) -> String {
    date.format("%-d-%b-%Y").to_string()
}

impl SearchWindow {
    /// IMAP `BEFORE` is exclusive, so the day after `until` is used.
    pub fn to_query(&self) -> String {
        let mut query = format!("SINCE \"{}\"", imap_date(self.since));
        if let Some(cutoff) = self.until.and_then(|until| until.checked_add_days(Days::new(1))) {
            query.push_str(&format!(" BEFORE \"{}\"", imap_date(cutoff)));
        }
        query
    }
}

/// Raw RFC 822 bodies of the messages in the window, newest first.
pub async fn fetch_raw_messages(session: &mut ImapSession, mailbox: &str, window: &SearchWindow) -> Result<Vec<Vec<u8>>> {
    session.select(mailbox).await?;
    info!("-- {} selected", mailbox);

    let query = window.to_query();
    let sequence_numbers = session.search(&query).await?;
    info!("-- {} messages match {}", sequence_numbers.len(), query);
    if sequence_numbers.is_empty() {
        return Ok(Vec::new());
    }

    let sequence_set = sequence_numbers.iter().sorted().join(",");
    let fetches: Vec<_> = session.fetch(&sequence_set, "RFC822").await?.try_collect().await?;

    let bodies = fetches
        .iter()
        .sorted_by_key(|fetch| std::cmp::Reverse(fetch.message))
        .filter_map(|fetch| fetch.body().map(<[u8]>::to_vec))
        .collect();
    Ok(bodies)
}
