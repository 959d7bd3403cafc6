//! Command dispatcher: one framed line in, its reply lines out.
//!
//! Every failure becomes a wire reply and the session carries on. Lookup
//! failures stay distinct in [`RegistryError`] and in the logs, while the
//! wire text keeps the generic `Unknown key` wording hosts expect.

use dataref_proto::{
    coerce, parse, parse_byte_list, Command, ErrorReply, KeyRef, Response, Serialize,
    SerializeError, Value, ValueKind, MAX_ARRAY_LEN, MAX_OUTBOUND_LINE,
};

use crate::config::EngineConfig;
use crate::device::{Device, ReplyLine};
use crate::registry::{Registry, RegistryError};
use crate::session::Session;
use crate::sink::{LineSink, SinkError};

/// Counters kept by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchStats {
    /// Non-blank lines handled.
    pub lines: u32,
    /// Lines answered with an `ERROR`, `UNKNOWN:` or `CMD_FAILED` reply.
    pub errors: u32,
}

/// Multi-line registry dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dump {
    /// Header, one `VALUE` per entry, `STATUS_END`.
    Status,
    /// One `LIST` per entry, `LIST_END`.
    List,
}

/// Where a dump stopped when the sink filled up.
#[derive(Debug, Clone, Copy)]
struct PendingDump {
    dump: Dump,
    next: usize,
}

/// Interprets commands against a registry, a session and a device.
///
/// Single-reply commands produce at most two lines of at most
/// [`MAX_OUTBOUND_LINE`] bytes each. `STATUS` and `LIST` grow with the
/// registry; if the sink fills during one, the dump is kept and continued
/// by [`resume`](Self::resume) once the sink has been drained.
pub struct Dispatcher<D, const N: usize> {
    config: EngineConfig,
    session: Session,
    registry: Registry<N>,
    device: D,
    stats: DispatchStats,
    pending: Option<PendingDump>,
}

/// Reply writer that counts lines and substitutes over-long replies.
struct Replies<'s, S> {
    out: &'s mut S,
    written: usize,
}

impl<S: LineSink> Replies<'_, S> {
    fn send<M: Serialize>(&mut self, msg: &M) -> Result<(), SinkError> {
        let mut buf = [0u8; MAX_OUTBOUND_LINE];
        let len = match msg.serialize(&mut buf) {
            Ok(len) => len,
            Err(SerializeError::BufferTooSmall | SerializeError::WriteError) => {
                warn!("reply does not fit {} bytes", MAX_OUTBOUND_LINE);
                Response::Error(ErrorReply::ResponseTooLong)
                    .serialize(&mut buf)
                    .map_err(|_| SinkError::Full)?
            }
        };
        self.out.write_line(&buf[..len])?;
        self.written += 1;
        Ok(())
    }

    fn error(&mut self, reply: ErrorReply<'_>) -> Result<(), SinkError> {
        self.send(&Response::Error(reply))
    }
}

impl<D: Device, const N: usize> Dispatcher<D, N> {
    #[must_use]
    pub fn new(config: EngineConfig, registry: Registry<N>, device: D) -> Self {
        Self {
            session: Session::new(config.identity),
            config,
            registry,
            device,
            stats: DispatchStats::default(),
            pending: None,
        }
    }

    /// Handle one framed, trimmed line, writing its replies to `out`.
    ///
    /// Returns the number of lines written. Blank lines get no reply.
    ///
    /// # Errors
    ///
    /// Only sink failures are returned; protocol failures are replies. On
    /// [`SinkError::Full`] during a dump, drain `out` and call
    /// [`resume`](Self::resume) before the next line.
    pub fn dispatch<S: LineSink>(&mut self, line: &[u8], out: &mut S) -> Result<usize, SinkError> {
        if self.pending.take().is_some() {
            warn!("unfinished dump dropped");
        }
        if line.is_empty() {
            return Ok(0);
        }
        self.stats.lines = self.stats.lines.wrapping_add(1);

        let mut replies = Replies { out, written: 0 };
        match parse(line) {
            Ok(cmd) => self.handle(cmd, &mut replies)?,
            Err(err) => {
                let text = utf8_prefix(line);
                debug!("parse error ({}): {}", err, text);
                self.count_error();
                replies.send(&Response::Unknown { line: text })?;
            }
        }
        Ok(replies.written)
    }

    /// Continue a dump cut short by a full sink.
    ///
    /// Returns the number of lines written; `0` when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns the sink error; after [`SinkError::Full`] the dump stays
    /// pending from the first line that did not fit.
    pub fn resume<S: LineSink>(&mut self, out: &mut S) -> Result<usize, SinkError> {
        let Some(PendingDump { dump, next }) = self.pending.take() else {
            return Ok(0);
        };
        let mut replies = Replies { out, written: 0 };
        self.write_dump(dump, next, &mut replies)?;
        Ok(replies.written)
    }

    /// A dump is waiting for [`resume`](Self::resume).
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Give up on a pending dump.
    pub fn discard_pending(&mut self) {
        if self.pending.take().is_some() {
            warn!("unfinished dump dropped");
        }
    }

    /// Replace the session with a fresh, unidentified one.
    pub fn reset_session(&mut self) {
        self.session = Session::new(self.config.identity);
        self.pending = None;
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn registry(&self) -> &Registry<N> {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut Registry<N> {
        &mut self.registry
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn into_parts(self) -> (Registry<N>, D) {
        (self.registry, self.device)
    }

    fn count_error(&mut self) {
        self.stats.errors = self.stats.errors.wrapping_add(1);
    }

    fn handle<S: LineSink>(
        &mut self,
        cmd: Command<'_>,
        replies: &mut Replies<'_, S>,
    ) -> Result<(), SinkError> {
        if self.config.require_handshake
            && !self.session.is_connected()
            && !matches!(cmd, Command::Hello | Command::Ping)
        {
            debug!("{} refused before handshake", cmd.verb().as_str());
            self.count_error();
            replies.error(ErrorReply::NotConnected)?;
            if let Command::Set { key, .. } | Command::Write { key, .. } = cmd {
                replies.send(&Response::AckError { key: key.raw() })?;
            }
            return Ok(());
        }

        match cmd {
            Command::Hello => {
                let (handshake, transitioned) = self.session.hello();
                if transitioned {
                    info!("session connected");
                    self.device.on_connected();
                }
                replies.send(&Response::Handshake(handshake))
            }
            Command::Set { key, value } => {
                let result = self.registry.write(&key, value);
                self.finish_write(key, value, result, replies)
            }
            Command::Write { key, kind, value } => self.handle_write(key, kind, value, replies),
            Command::Get { key } => self.handle_read(key, None, replies),
            Command::Read { key, kind } => self.handle_read(key, Some(kind), replies),
            Command::Cmd { path } => match self.device.execute(path) {
                Ok(()) => replies.send(&Response::CmdExecuted { path }),
                Err(err) => {
                    warn!("CMD {} failed: {}", path, err);
                    if self.config.report_cmd_failures {
                        self.count_error();
                        replies.send(&Response::CmdFailed { path })
                    } else {
                        replies.send(&Response::CmdExecuted { path })
                    }
                }
            },
            Command::Ping => replies.send(&Response::Pong),
            Command::Status => self.write_dump(Dump::Status, 0, replies),
            Command::List => self.write_dump(Dump::List, 0, replies),
            Command::Test => {
                let passed = self.device.self_test();
                if !passed {
                    warn!("self test failed");
                }
                replies.send(&Response::Test { passed })
            }
            Command::Unknown { line } => self.handle_unknown(line, replies),
        }
    }

    fn handle_write<S: LineSink>(
        &mut self,
        key: KeyRef<'_>,
        kind: &str,
        raw: &str,
        replies: &mut Replies<'_, S>,
    ) -> Result<(), SinkError> {
        let Some(kind_tag) = ValueKind::from_name(kind) else {
            debug!("WRITE {}: unknown type {}", key, kind);
            self.count_error();
            replies.error(ErrorReply::UnknownType { kind })?;
            return replies.send(&Response::AckError { key: key.raw() });
        };

        let value = if kind_tag == ValueKind::ByteArray {
            let mut parsed = [0u8; MAX_ARRAY_LEN];
            parse_byte_list(raw, &mut parsed)
                .ok()
                .and_then(|count| Value::from_bytes(&parsed[..count]))
                .ok_or(RegistryError::TypeMismatch)
        } else {
            coerce(raw, kind_tag).map_err(|_| RegistryError::TypeMismatch)
        };

        let result = value.and_then(|value| self.registry.set(&key, &value));
        self.finish_write(key, raw, result, replies)
    }

    fn finish_write<S: LineSink>(
        &mut self,
        key: KeyRef<'_>,
        raw: &str,
        result: Result<(), RegistryError>,
        replies: &mut Replies<'_, S>,
    ) -> Result<(), SinkError> {
        match result {
            Ok(()) => {
                if let Ok(stored) = self.registry.read(&key) {
                    self.device.on_write(&key, &stored);
                }
                replies.send(&Response::Ack {
                    key: key.raw(),
                    value: raw,
                })
            }
            Err(err) => {
                debug!("write {} rejected: {}", key, err);
                self.count_error();
                let reply = match err {
                    RegistryError::TypeMismatch => ErrorReply::InvalidValue { value: raw },
                    _ => ErrorReply::WriteRejected { key: key.raw() },
                };
                replies.error(reply)?;
                replies.send(&Response::AckError { key: key.raw() })
            }
        }
    }

    fn handle_read<S: LineSink>(
        &mut self,
        key: KeyRef<'_>,
        kind: Option<&str>,
        replies: &mut Replies<'_, S>,
    ) -> Result<(), SinkError> {
        let kind_tag = match kind.map(|k| (k, ValueKind::from_name(k))) {
            Some((k, None)) => {
                debug!("READ {}: unknown type {}", key, k);
                self.count_error();
                return replies.error(ErrorReply::UnknownType { kind: k });
            }
            Some((_, tag)) => tag,
            None => None,
        };

        if let Some(live) = self.device.on_read(&key) {
            if let Err(err) = self.registry.set(&key, &live) {
                warn!("live value for {} not stored: {}", key, err);
            }
        }

        let value = match self.registry.read(&key) {
            Ok(value) => value,
            Err(err) => {
                debug!("read {} failed: {}", key, err);
                self.count_error();
                return replies.error(ErrorReply::UnknownKey { key: key.raw() });
            }
        };

        let value = match (kind, kind_tag) {
            (Some(k), Some(tag)) => match value.coerce_to(tag) {
                Some(value) => value,
                None => {
                    self.count_error();
                    return replies.error(ErrorReply::TypeMismatch {
                        key: key.raw(),
                        kind: k,
                    });
                }
            },
            _ => value,
        };

        replies.send(&Response::Value {
            key: key.raw(),
            value: &value,
            kind,
        })
    }

    fn handle_unknown<S: LineSink>(
        &mut self,
        line: &str,
        replies: &mut Replies<'_, S>,
    ) -> Result<(), SinkError> {
        let mut reply = ReplyLine::new();
        if self.device.handle_unknown(line, &mut reply) {
            return replies.send(&Response::Custom { line: &reply });
        }
        debug!("unknown command: {}", line);
        if self.config.echo_unknown {
            self.count_error();
            replies.send(&Response::Unknown { line })?;
        }
        Ok(())
    }

    fn write_dump<S: LineSink>(
        &mut self,
        dump: Dump,
        from: usize,
        replies: &mut Replies<'_, S>,
    ) -> Result<(), SinkError> {
        let entries = self.registry.len();
        let lines = match dump {
            Dump::Status => entries + 2,
            Dump::List => entries + 1,
        };
        for next in from..lines {
            if let Err(err) = self.dump_line(dump, next, replies) {
                if err == SinkError::Full {
                    debug!("dump paused at line {}", next);
                    self.pending = Some(PendingDump { dump, next });
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn dump_line<S: LineSink>(
        &self,
        dump: Dump,
        index: usize,
        replies: &mut Replies<'_, S>,
    ) -> Result<(), SinkError> {
        match dump {
            Dump::Status if index == 0 => replies.send(&Response::Status {
                connected: self.session.is_connected(),
                device_name: self.session.identity().device_name,
                entries: self.registry.len(),
            }),
            Dump::Status => match self.registry.iter().nth(index - 1) {
                Some(entry) => replies.send(&Response::Value {
                    key: entry.name(),
                    value: entry.value(),
                    kind: None,
                }),
                None => replies.send(&Response::StatusEnd),
            },
            Dump::List => match self.registry.iter().nth(index) {
                Some(entry) => replies.send(&Response::ListEntry {
                    key: entry.name(),
                    kind: entry.kind(),
                    arity: entry.arity(),
                }),
                None => replies.send(&Response::ListEnd {
                    count: self.registry.len(),
                }),
            },
        }
    }
}

/// The longest valid UTF-8 prefix of `line`.
fn utf8_prefix(line: &[u8]) -> &str {
    match core::str::from_utf8(line) {
        Ok(text) => text,
        Err(err) => {
            // valid_up_to() marks a char boundary, so this cannot fail
            core::str::from_utf8(&line[..err.valid_up_to()]).unwrap_or_default()
        }
    }
}
