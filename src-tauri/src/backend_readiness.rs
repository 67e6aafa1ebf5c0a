use std::{
    io,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use url::Url;

use crate::{
    backend_config::ReadinessSettings,
    backend_http::{self, ProbeError},
    service_bootstrap::ShutdownSignal,
};

/// How one polling session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadinessOutcome {
    Ready { attempts: u32, elapsed: Duration },
    TimedOut { attempts: u32, elapsed: Duration },
    Cancelled { attempts: u32 },
}

/// Polls the backend until it answers, then hands off exactly once.
#[derive(Debug, Clone)]
pub(crate) struct ReadinessWatcher {
    settings: ReadinessSettings,
    shutdown: ShutdownSignal,
}

impl ReadinessWatcher {
    pub(crate) fn new(settings: ReadinessSettings, shutdown: ShutdownSignal) -> Self {
        Self { settings, shutdown }
    }

    pub(crate) fn wait_and_handoff<N>(&self, probe_url: &Url, navigate: N) -> ReadinessOutcome
    where
        N: FnOnce(&Url),
    {
        self.wait_with_probe(
            probe_url,
            |url, timeout| backend_http::probe_http(url, timeout).map(|_| ()),
            navigate,
        )
    }

    fn wait_with_probe<P, N>(&self, probe_url: &Url, mut probe: P, navigate: N) -> ReadinessOutcome
    where
        P: FnMut(&Url, Duration) -> Result<(), ProbeError>,
        N: FnOnce(&Url),
    {
        let started = Instant::now();
        let mut attempts = 0_u32;

        loop {
            if self.shutdown.is_triggered() {
                return ReadinessOutcome::Cancelled { attempts };
            }
            let elapsed = started.elapsed();
            if elapsed >= self.settings.overall_timeout {
                return ReadinessOutcome::TimedOut { attempts, elapsed };
            }

            attempts += 1;
            let attempt_timeout = self
                .settings
                .probe_timeout
                .min(self.settings.overall_timeout - elapsed);
            match probe(probe_url, attempt_timeout) {
                Ok(()) => {
                    navigate(probe_url);
                    return ReadinessOutcome::Ready {
                        attempts,
                        elapsed: started.elapsed(),
                    };
                }
                Err(error) => {
                    tracing::trace!(target: "desktop::startup", attempt = attempts, %error, "backend not ready");
                }
            }

            if self.shutdown.sleep(self.settings.poll_interval) {
                return ReadinessOutcome::Cancelled { attempts };
            }
        }
    }

    /// Runs the polling session on its own thread. `on_finished` sees the
    /// outcome after any handoff has happened.
    pub(crate) fn spawn<N, F>(
        self,
        probe_url: Url,
        navigate: N,
        on_finished: F,
    ) -> io::Result<JoinHandle<ReadinessOutcome>>
    where
        N: FnOnce(&Url) + Send + 'static,
        F: FnOnce(ReadinessOutcome) + Send + 'static,
    {
        thread::Builder::new()
            .name("backend-readiness".to_string())
            .spawn(move || {
                let outcome = self.wait_and_handoff(&probe_url, navigate);
                on_finished(outcome);
                outcome
            })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        sync::{Arc, Mutex},
    };

    use super::*;

    fn settings(poll_ms: u64, probe_ms: u64, overall_ms: u64) -> ReadinessSettings {
        ReadinessSettings {
            poll_interval: Duration::from_millis(poll_ms),
            probe_timeout: Duration::from_millis(probe_ms),
            overall_timeout: Duration::from_millis(overall_ms),
        }
    }

    fn local_url(port: u16) -> Url {
        Url::parse(&format!("http://127.0.0.1:{port}/")).expect("url")
    }

    fn refused() -> ProbeError {
        ProbeError::Io(io::Error::from(io::ErrorKind::ConnectionRefused))
    }

    #[test]
    fn handoff_happens_once_after_first_successful_probe() {
        let watcher = ReadinessWatcher::new(settings(1, 50, 5_000), ShutdownSignal::new());
        let url = local_url(5000);
        let mut remaining_failures = 2;
        let mut navigated = Vec::new();

        let outcome = watcher.wait_with_probe(
            &url,
            |_, _| {
                if remaining_failures > 0 {
                    remaining_failures -= 1;
                    return Err(refused());
                }
                Ok(())
            },
            |target| navigated.push(target.clone()),
        );

        assert!(matches!(outcome, ReadinessOutcome::Ready { attempts: 3, .. }));
        assert_eq!(navigated, vec![url]);
    }

    #[test]
    fn attempt_timeout_never_exceeds_remaining_budget() {
        let watcher = ReadinessWatcher::new(settings(1, 1_000, 150), ShutdownSignal::new());
        let mut offered = Vec::new();

        let outcome = watcher.wait_with_probe(
            &local_url(5000),
            |_, timeout| {
                offered.push(timeout);
                thread::sleep(Duration::from_millis(40));
                Err(refused())
            },
            |_| panic!("must not navigate"),
        );

        assert!(matches!(outcome, ReadinessOutcome::TimedOut { .. }));
        assert!(!offered.is_empty());
        assert!(offered
            .iter()
            .all(|timeout| *timeout <= Duration::from_millis(150)));
    }

    #[test]
    fn shutdown_cancels_polling_without_handoff() {
        let shutdown = ShutdownSignal::new();
        let watcher = ReadinessWatcher::new(settings(10, 50, 60_000), shutdown.clone());
        let mut calls = 0;

        let outcome = watcher.wait_with_probe(
            &local_url(5000),
            |_, _| {
                calls += 1;
                if calls == 2 {
                    shutdown.trigger();
                }
                Err(refused())
            },
            |_| panic!("must not navigate"),
        );

        assert_eq!(outcome, ReadinessOutcome::Cancelled { attempts: 2 });
    }

    #[test]
    fn navigate_waits_until_backend_starts_answering() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = local_url(listener.local_addr().expect("addr").port());
        let answering_since = Arc::new(Mutex::new(None::<Instant>));
        let server_clock = answering_since.clone();
        let stop = ShutdownSignal::new();
        let server_stop = stop.clone();

        listener.set_nonblocking(true).expect("nonblocking");
        let server = thread::spawn(move || {
            thread::sleep(Duration::from_millis(400));
            *server_clock.lock().expect("clock") = Some(Instant::now());
            while !server_stop.is_triggered() {
                match listener.accept() {
                    Ok((mut stream, _)) => {
                        let _ = stream.set_nonblocking(false);
                        let mut request = [0_u8; 512];
                        let _ = stream.read(&mut request);
                        let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
                    }
                    Err(_) => thread::sleep(Duration::from_millis(5)),
                }
            }
        });

        let navigations = Arc::new(Mutex::new(Vec::<(Url, Instant)>::new()));
        let recorder = navigations.clone();
        let handle = ReadinessWatcher::new(settings(100, 150, 10_000), ShutdownSignal::new())
            .spawn(
                url.clone(),
                move |target| {
                    recorder
                        .lock()
                        .expect("navigations")
                        .push((target.clone(), Instant::now()));
                },
                |_| {},
            )
            .expect("spawn watcher");

        let outcome = handle.join().expect("watcher thread");
        stop.trigger();
        server.join().expect("server");

        assert!(matches!(outcome, ReadinessOutcome::Ready { .. }));
        let navigations = navigations.lock().expect("navigations");
        assert_eq!(navigations.len(), 1);
        assert_eq!(navigations[0].0, url);
        let answering_since = answering_since
            .lock()
            .expect("clock")
            .expect("server started answering");
        assert!(navigations[0].1 >= answering_since);
    }

    #[test]
    fn unreachable_backend_times_out_without_handoff() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = local_url(listener.local_addr().expect("addr").port());
        drop(listener);

        let navigated = Arc::new(Mutex::new(0_u32));
        let counter = navigated.clone();
        let finished = Arc::new(Mutex::new(None));
        let finished_slot = finished.clone();
        let started = Instant::now();
        let handle = ReadinessWatcher::new(settings(100, 100, 400), ShutdownSignal::new())
            .spawn(
                url,
                move |_| *counter.lock().expect("counter") += 1,
                move |outcome| *finished_slot.lock().expect("slot") = Some(outcome),
            )
            .expect("spawn watcher");

        let outcome = handle.join().expect("watcher exits cleanly");
        assert!(matches!(outcome, ReadinessOutcome::TimedOut { .. }));
        assert!(started.elapsed() >= Duration::from_millis(400));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(*navigated.lock().expect("counter"), 0);
        assert_eq!(*finished.lock().expect("slot"), Some(outcome));
    }
}
