//! syslog 处理器
//!
//! 以 RFC 3164 报文写入本机 syslog 套接字（`/dev/log`）。
//! 发送失败不影响请求，只在第一次失败时告警。

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(unix)]
use parking_lot::Mutex;

use super::formatter::{LineFormatter, SYSLOG_LINE_FORMAT};
use super::{LogHandler, LogRecord};

/// syslog 标识
pub const SYSLOG_IDENT: &str = "preflight";

#[cfg(unix)]
const SYSLOG_SOCKET: &str = "/dev/log";

/// syslog facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facility {
    Kern,
    User,
    Mail,
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Uucp,
    Cron,
    AuthPriv,
    Ftp,
    Local0,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
}

impl Facility {
    pub fn code(&self) -> u8 {
        match self {
            Facility::Kern => 0,
            Facility::User => 1,
            Facility::Mail => 2,
            Facility::Daemon => 3,
            Facility::Auth => 4,
            Facility::Syslog => 5,
            Facility::Lpr => 6,
            Facility::News => 7,
            Facility::Uucp => 8,
            Facility::Cron => 9,
            Facility::AuthPriv => 10,
            Facility::Ftp => 11,
            Facility::Local0 => 16,
            Facility::Local1 => 17,
            Facility::Local2 => 18,
            Facility::Local3 => 19,
            Facility::Local4 => 20,
            Facility::Local5 => 21,
            Facility::Local6 => 22,
            Facility::Local7 => 23,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Facility::Kern => "kern",
            Facility::User => "user",
            Facility::Mail => "mail",
            Facility::Daemon => "daemon",
            Facility::Auth => "auth",
            Facility::Syslog => "syslog",
            Facility::Lpr => "lpr",
            Facility::News => "news",
            Facility::Uucp => "uucp",
            Facility::Cron => "cron",
            Facility::AuthPriv => "authpriv",
            Facility::Ftp => "ftp",
            Facility::Local0 => "local0",
            Facility::Local1 => "local1",
            Facility::Local2 => "local2",
            Facility::Local3 => "local3",
            Facility::Local4 => "local4",
            Facility::Local5 => "local5",
            Facility::Local6 => "local6",
            Facility::Local7 => "local7",
        }
    }

    /// 解析 facility 名称，忽略大小写，接受 `LOG_` 前缀
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        let bare = lower.strip_prefix("log_").unwrap_or(&lower);
        let facility = match bare {
            "kern" => Facility::Kern,
            "user" => Facility::User,
            "mail" => Facility::Mail,
            "daemon" => Facility::Daemon,
            "auth" => Facility::Auth,
            "syslog" => Facility::Syslog,
            "lpr" => Facility::Lpr,
            "news" => Facility::News,
            "uucp" => Facility::Uucp,
            "cron" => Facility::Cron,
            "authpriv" => Facility::AuthPriv,
            "ftp" => Facility::Ftp,
            "local0" => Facility::Local0,
            "local1" => Facility::Local1,
            "local2" => Facility::Local2,
            "local3" => Facility::Local3,
            "local4" => Facility::Local4,
            "local5" => Facility::Local5,
            "local6" => Facility::Local6,
            "local7" => Facility::Local7,
            _ => return None,
        };
        Some(facility)
    }
}

pub struct SyslogHandler {
    ident: String,
    facility: Facility,
    formatter: LineFormatter,
    #[cfg(unix)]
    socket: Mutex<Option<std::os::unix::net::UnixDatagram>>,
    warned: AtomicBool,
}

impl std::fmt::Debug for SyslogHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyslogHandler")
            .field("ident", &self.ident)
            .field("facility", &self.facility)
            .field("format", &self.formatter.format_string())
            .finish()
    }
}

impl SyslogHandler {
    /// 使用固定行格式创建
    pub fn new(ident: impl Into<String>, facility: Facility) -> Self {
        Self {
            ident: ident.into(),
            facility,
            formatter: LineFormatter::new(SYSLOG_LINE_FORMAT),
            #[cfg(unix)]
            socket: Mutex::new(None),
            warned: AtomicBool::new(false),
        }
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn facility(&self) -> Facility {
        self.facility
    }

    pub fn formatter(&self) -> &LineFormatter {
        &self.formatter
    }

    /// 组装 RFC 3164 报文：`<PRI>ident[pid]: line`
    pub fn frame(&self, record: &LogRecord) -> String {
        let priority = u16::from(self.facility.code()) * 8 + u16::from(record.level.syslog_severity());
        format!(
            "<{}>{}[{}]: {}",
            priority,
            self.ident,
            std::process::id(),
            self.formatter.format(record)
        )
    }

    #[cfg(unix)]
    fn send(&self, frame: &str) -> std::io::Result<()> {
        use std::os::unix::net::UnixDatagram;

        let mut socket = self.socket.lock();
        if socket.is_none() {
            let datagram = UnixDatagram::unbound()?;
            datagram.connect(SYSLOG_SOCKET)?;
            *socket = Some(datagram);
        }
        let sent = match socket.as_ref() {
            Some(datagram) => datagram.send(frame.as_bytes()).map(|_| ()),
            None => Ok(()),
        };
        if sent.is_err() {
            // 连接失效时丢弃，下一条记录重新连接
            *socket = None;
        }
        sent
    }

    #[cfg(not(unix))]
    fn send(&self, _frame: &str) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "syslog socket is only available on unix",
        ))
    }
}

impl LogHandler for SyslogHandler {
    fn name(&self) -> &str {
        "syslog"
    }

    fn handle(&self, record: &LogRecord) {
        let frame = self.frame(record);
        if let Err(e) = self.send(&frame) {
            if !self.warned.swap(true, Ordering::Relaxed) {
                tracing::warn!("[Syslog] 写入 syslog 失败，后续失败不再提示: {}", e);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
