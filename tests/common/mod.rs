#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use procsnap::system::ProcPaths;
use tempfile::TempDir;

pub const CLOCK_TICKS: u64 = 100;

pub const OS_RELEASE: &str = "NAME=\"Fixture Linux\"\nPRETTY_NAME=\"Fixture Linux 1.0\"\nID=fixture\n";
pub const VERSION: &str = "Linux version 6.1.0-fixture (builder@host) (gcc 13.2.0) #1 SMP\n";
pub const UPTIME: &str = "10.00 5.00\n";
pub const MEMINFO: &str = "MemTotal:       1000 kB\nMemFree:         400 kB\nMemAvailable:    600 kB\nBuffers:         100 kB\nCached:          100 kB\n";
pub const STAT: &str = "cpu  100 0 100 800 0 0 0 0 0 0\ncpu0 100 0 100 800 0 0 0 0 0 0\nintr 0\nctxt 0\nbtime 0\nprocesses 812\nprocs_running 3\nprocs_blocked 0\n";
pub const PASSWD: &str = "root:x:0:0:root:/root:/bin/bash\nalice:x:1000:1000:Alice:/home/alice:/bin/zsh\n";

/// Per-process fixture values.
pub struct FakeProcess<'a> {
    pub pid: u32,
    pub comm: &'a str,
    pub uid: u32,
    pub rss_kb: Option<u64>,
    pub utime: u64,
    pub stime: u64,
    pub starttime: u64,
    pub cmdline: &'a [u8],
}

/// A throwaway filesystem root with `proc/` and `etc/` under it.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("create fixture dir");
        fs::create_dir_all(dir.path().join("proc")).expect("create proc");
        fs::create_dir_all(dir.path().join("etc")).expect("create etc");
        Fixture { dir }
    }

    /// Machine-wide files with the values from `MEMINFO`, `STAT`, etc.
    pub fn standard() -> Self {
        let fixture = Self::empty();
        fixture.write("etc/os-release", OS_RELEASE);
        fixture.write("etc/passwd", PASSWD);
        fixture.write("proc/version", VERSION);
        fixture.write("proc/uptime", UPTIME);
        fixture.write("proc/meminfo", MEMINFO);
        fixture.write("proc/stat", STAT);
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> ProcPaths {
        ProcPaths::rooted_at(self.root())
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write fixture file");
    }

    pub fn remove(&self, rel: &str) {
        let path = self.path(rel);
        if path.is_dir() {
            fs::remove_dir_all(path).expect("remove fixture dir");
        } else {
            fs::remove_file(path).expect("remove fixture file");
        }
    }

    pub fn add_process(&self, p: &FakeProcess<'_>) {
        let pid = p.pid;
        self.write(
            &format!("proc/{pid}/stat"),
            format!(
                "{pid} ({}) S 1 {pid} {pid} 0 -1 4194560 0 0 0 0 {} {} 0 0 20 0 1 0 {} 0 0\n",
                p.comm, p.utime, p.stime, p.starttime
            ),
        );
        let mut status = format!(
            "Name:\t{}\nState:\tS (sleeping)\nUid:\t{uid}\t{uid}\t{uid}\t{uid}\n",
            p.comm,
            uid = p.uid
        );
        if let Some(rss) = p.rss_kb {
            status.push_str(&format!("VmSize:\t{} kB\nVmRSS:\t{rss} kB\n", rss * 4));
        }
        self.write(&format!("proc/{pid}/status"), status);
        self.write(&format!("proc/{pid}/cmdline"), p.cmdline);
    }

    /// The three processes most tests use: a root daemon, a user process and
    /// a kernel thread.
    pub fn with_sample_processes(self) -> Self {
        self.add_process(&FakeProcess {
            pid: 1,
            comm: "systemd",
            uid: 0,
            rss_kb: Some(12288),
            utime: 100,
            stime: 50,
            starttime: 0,
            cmdline: b"/sbin/init\0",
        });
        self.add_process(&FakeProcess {
            pid: 7,
            comm: "python3",
            uid: 1000,
            rss_kb: Some(20480),
            utime: 160,
            stime: 0,
            starttime: 200,
            cmdline: b"python3\0app.py\0",
        });
        self.add_process(&FakeProcess {
            pid: 2,
            comm: "kthreadd",
            uid: 0,
            rss_kb: None,
            utime: 0,
            stime: 0,
            starttime: 0,
            cmdline: b"",
        });
        self
    }
}
