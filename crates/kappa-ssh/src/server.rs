//! The SSH server: listener, accept loop, and admin seeding.

use crate::error::SshError;
use crate::handler::Connection;
use kappa_commons::{UserName, ADMIN_USERNAME};
use kappa_datamodel::{marshal_key_data, System};
use log::{debug, info, trace, warn};
use russh::keys::PrivateKey;
use russh::MethodSet;
use ssh_key::{Certificate, HashAlg, PublicKey};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;

/// Configuration for [`SshServer`].
pub struct SshServerOptions {
    /// Listen address. Empty is a fatal configuration error.
    pub bind: String,

    /// Maximum time the listener blocks between accepts. Bounds shutdown
    /// latency.
    pub deadline: Duration,

    /// The server's SSH host key.
    pub host_key: PrivateKey,

    /// The admin account's OpenSSH certificate, added to the admin key ring
    /// at startup.
    pub admin_cert: Certificate,

    /// Trusted root the admin certificate must be signed by.
    pub ca_key: PublicKey,

    /// Tolerated clock skew when validating certificate validity windows.
    pub clock_skew: Duration,
}

/// Certificate-seeded SSH server over the metadata store.
pub struct SshServer {
    options: SshServerOptions,
    system: System,
    config: Arc<russh::server::Config>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SshServer {
    /// Validates configuration and seeds the admin account.
    ///
    /// Admin seeding failures are fatal: the server refuses to start without
    /// a verifiable admin certificate.
    pub fn new(options: SshServerOptions, system: System) -> Result<Self, SshError> {
        if options.bind.is_empty() {
            return Err(SshError::EmptyBindAddress);
        }

        seed_admin(
            &system,
            &options.admin_cert,
            &options.ca_key,
            options.clock_skew,
        )?;

        let config = russh::server::Config {
            methods: MethodSet::PUBLICKEY,
            keys: vec![options.host_key.clone()],
            ..Default::default()
        };

        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            options,
            system,
            config: Arc::new(config),
            shutdown,
            task: None,
        })
    }

    /// Binds the listener and starts the accept loop.
    pub async fn start(&mut self) -> Result<(), SshError> {
        let listener = TcpListener::bind(&self.options.bind).await?;
        info!("starting SSH server addr={}", self.options.bind);

        let task = tokio::spawn(accept_loop(
            listener,
            self.config.clone(),
            self.system.clone(),
            self.options.deadline,
            self.shutdown.subscribe(),
        ));
        self.task = Some(task);
        Ok(())
    }

    /// Signals shutdown and waits for the accept loop and every connection
    /// task to finish.
    pub async fn stop(mut self) {
        info!("shutting down SSH server");
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Verifies the admin certificate against the trusted root and installs its
/// public key in the admin account's key ring.
fn seed_admin(
    system: &System,
    cert: &Certificate,
    ca_key: &PublicKey,
    clock_skew: Duration,
) -> Result<(), SshError> {
    let ca_fingerprint = ca_key.fingerprint(HashAlg::Sha256);
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs();

    // The skew window tolerates freshly issued certificates whose validity
    // starts slightly in the future.
    cert.validate_at(now + clock_skew.as_secs(), [&ca_fingerprint])
        .map_err(|e| SshError::InvalidAdminCertificate(e.to_string()))?;

    let users = system.users();
    let admin = users.create(&UserName::new(ADMIN_USERNAME))?;

    let blob = marshal_key_data(cert.public_key())?;
    let fingerprint = admin.key_ring().add_marshalled_key(blob)?;
    info!("added admin certificate fingerprint={}", fingerprint);
    Ok(())
}

async fn accept_loop(
    listener: TcpListener,
    config: Arc<russh::server::Config>,
    system: System,
    deadline: Duration,
    shutdown: watch::Receiver<bool>,
) {
    let mut connections: JoinSet<()> = JoinSet::new();

    loop {
        if *shutdown.borrow() {
            break;
        }

        // Accepts block for at most `deadline` so the shutdown signal is
        // observed promptly.
        match timeout(deadline, listener.accept()).await {
            Err(_) => {
                trace!("connection timeout...");
            }
            Ok(Err(err)) => {
                warn!("connection failed error={}", err);
            }
            Ok(Ok((stream, peer))) => {
                debug!("successful TCP connection: {}", peer);
                let config = config.clone();
                let handler = Connection::new(system.clone(), Some(peer));
                connections.spawn(async move {
                    match russh::server::run_stream(config, stream, handler).await {
                        Ok(session) => {
                            if let Err(err) = session.await {
                                debug!("ssh session ended error={}", err);
                            }
                        }
                        Err(err) => {
                            warn!("SSH handshake failed error={}", err);
                        }
                    }
                });
            }
        }

        // Reap finished connection tasks as we go.
        while connections.try_join_next().is_some() {}
    }

    connections.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use ssh_key::certificate::{Builder, CertType};
    use ssh_key::Algorithm;

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn generate_key() -> PrivateKey {
        PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap()
    }

    fn issue_cert(ca: &PrivateKey, subject: &PrivateKey, valid_after: u64, valid_before: u64) -> Certificate {
        let mut builder = Builder::new_with_random_nonce(
            &mut OsRng,
            subject.public_key().key_data().clone(),
            valid_after,
            valid_before,
        )
        .unwrap();
        builder.cert_type(CertType::User).unwrap();
        builder.key_id("admin").unwrap();
        builder.valid_principal("admin").unwrap();
        builder.sign(ca).unwrap()
    }

    #[test]
    fn test_seed_admin_installs_certificate_key() {
        let system = System::in_memory();
        let ca = generate_key();
        let subject = generate_key();
        let cert = issue_cert(&ca, &subject, unix_now() - 60, unix_now() + 3600);

        seed_admin(
            &system,
            &cert,
            ca.public_key(),
            Duration::from_secs(600),
        )
        .unwrap();

        let admin = system.users().get(&UserName::new("admin")).unwrap();
        let blob = marshal_key_data(cert.public_key()).unwrap();
        assert!(admin.key_ring().contains(&blob).unwrap());
    }

    #[test]
    fn test_seed_admin_rejects_unknown_root() {
        let system = System::in_memory();
        let ca = generate_key();
        let other_ca = generate_key();
        let subject = generate_key();
        let cert = issue_cert(&ca, &subject, unix_now() - 60, unix_now() + 3600);

        let err = seed_admin(
            &system,
            &cert,
            other_ca.public_key(),
            Duration::from_secs(600),
        )
        .unwrap_err();
        assert!(matches!(err, SshError::InvalidAdminCertificate(_)));
        assert!(system.users().get(&UserName::new("admin")).is_err());
    }

    #[test]
    fn test_seed_admin_rejects_expired_certificate() {
        let system = System::in_memory();
        let ca = generate_key();
        let subject = generate_key();
        let cert = issue_cert(&ca, &subject, unix_now() - 7200, unix_now() - 3600);

        let err = seed_admin(&system, &cert, ca.public_key(), Duration::from_secs(600))
            .unwrap_err();
        assert!(matches!(err, SshError::InvalidAdminCertificate(_)));
    }

    #[test]
    fn test_skew_window_tolerates_future_validity() {
        let system = System::in_memory();
        let ca = generate_key();
        let subject = generate_key();
        // Valid 2 minutes from now; inside the 10 minute skew window.
        let cert = issue_cert(&ca, &subject, unix_now() + 120, unix_now() + 3600);

        seed_admin(&system, &cert, ca.public_key(), Duration::from_secs(600)).unwrap();
    }

    #[test]
    fn test_empty_bind_address_is_fatal() {
        let system = System::in_memory();
        let ca = generate_key();
        let subject = generate_key();
        let cert = issue_cert(&ca, &subject, unix_now() - 60, unix_now() + 3600);

        let options = SshServerOptions {
            bind: String::new(),
            deadline: Duration::from_secs(1),
            host_key: generate_key(),
            admin_cert: cert,
            ca_key: ca.public_key().clone(),
            clock_skew: Duration::from_secs(600),
        };

        assert!(matches!(
            SshServer::new(options, system),
            Err(SshError::EmptyBindAddress)
        ));
    }
}
