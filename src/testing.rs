//! Fake collaborators for host-side tests.

use std::collections::{BTreeMap, VecDeque};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::drivers::{Console, Power};
use crate::fs::{File, FileSystem};
use crate::mm::{AddressSpace, Mapping, PageFlags, UserAddr, PAGE_SIZE};
use crate::process::{program_name, ChildLink, Pid, Process, ProcessManager};
use crate::sync::IoLock;
use crate::syscall::{dispatch, Services, SyscallOutcome, TrapFrame};

type Page = [u8; PAGE_SIZE];

/// Heap-backed user address space. All pids share it.
pub struct FakeMemory {
    pages: Mutex<BTreeMap<u32, (NonNull<Page>, PageFlags)>>,
}

// SAFETY: pages are only reached through the mutex or through pointers
// handed out by `translate`, which tests use from one thread at a time.
unsafe impl Send for FakeMemory {}
unsafe impl Sync for FakeMemory {}

impl FakeMemory {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(BTreeMap::new()),
        }
    }

    /// Map a zeroed page at the page containing `addr`.
    pub fn map(&self, addr: u32, flags: PageFlags) {
        let base = UserAddr::new(addr).page_base().as_u32();
        self.pages.lock().unwrap().entry(base).or_insert_with(|| {
            let page = Box::new([0u8; PAGE_SIZE]);
            (NonNull::from(Box::leak(page)), flags)
        });
    }

    fn byte_ptr(&self, addr: u32) -> *mut u8 {
        let addr = UserAddr::new(addr);
        let pages = self.pages.lock().unwrap();
        let (page, _) = pages
            .get(&addr.page_base().as_u32())
            .unwrap_or_else(|| panic!("test touched unmapped {}", addr));
        // SAFETY: offset is within the page.
        unsafe { page.as_ptr().cast::<u8>().add(addr.page_offset()) }
    }

    /// Write bytes regardless of page permissions.
    pub fn poke(&self, addr: u32, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            // SAFETY: `byte_ptr` points into a live page.
            unsafe { self.byte_ptr(addr + i as u32).write(byte) };
        }
    }

    /// Write little-endian words.
    pub fn poke_words(&self, addr: u32, words: &[u32]) {
        for (i, word) in words.iter().enumerate() {
            self.poke(addr + 4 * i as u32, &word.to_le_bytes());
        }
    }

    /// Read bytes regardless of page permissions.
    pub fn peek(&self, addr: u32, len: usize) -> Vec<u8> {
        (0..len)
            // SAFETY: `byte_ptr` points into a live page.
            .map(|i| unsafe { self.byte_ptr(addr + i as u32).read() })
            .collect()
    }
}

impl Drop for FakeMemory {
    fn drop(&mut self) {
        let pages = self.pages.get_mut().unwrap_or_else(|e| e.into_inner());
        for (_, (page, _)) in std::mem::take(pages) {
            // SAFETY: every page came from `Box::leak` in `map`.
            drop(unsafe { Box::from_raw(page.as_ptr()) });
        }
    }
}

// SAFETY: pointers stay valid until the `FakeMemory` is dropped, and each
// points into a page of `PAGE_SIZE` bytes.
unsafe impl AddressSpace for FakeMemory {
    fn translate(&self, _pid: Pid, vaddr: UserAddr) -> Option<Mapping> {
        let pages = self.pages.lock().unwrap();
        let (page, flags) = pages.get(&vaddr.page_base().as_u32())?;
        // SAFETY: offset is within the page.
        let byte = unsafe { page.as_ptr().cast::<u8>().add(vaddr.page_offset()) };
        Some(Mapping::new(NonNull::new(byte)?, *flags))
    }
}

/// Counts how many handles to one file are open.
#[derive(Clone, Default)]
pub struct OpenTracker {
    count: Arc<AtomicUsize>,
}

impl OpenTracker {
    pub fn is_open(&self) -> bool {
        self.count.load(Ordering::SeqCst) > 0
    }

    pub fn open_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// In-memory file. Open handles share contents through an `Arc`.
pub struct MemFile {
    data: Arc<Mutex<Vec<u8>>>,
    pos: usize,
    tracker: OpenTracker,
}

impl MemFile {
    fn open(data: Arc<Mutex<Vec<u8>>>, tracker: OpenTracker) -> Self {
        tracker.count.fetch_add(1, Ordering::SeqCst);
        Self { data, pos: 0, tracker }
    }

    /// A file not backed by any `FakeFs`.
    pub fn detached(contents: &[u8]) -> Self {
        Self::tracked(contents).1
    }

    /// A file plus a tracker that observes when it is closed.
    pub fn tracked(contents: &[u8]) -> (OpenTracker, Self) {
        let tracker = OpenTracker::default();
        let file = Self::open(Arc::new(Mutex::new(contents.to_vec())), tracker.clone());
        (tracker, file)
    }
}

impl Drop for MemFile {
    fn drop(&mut self) {
        self.tracker.count.fetch_sub(1, Ordering::SeqCst);
    }
}

impl File for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let data = self.data.lock().unwrap();
        let start = self.pos.min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.pos += n;
        n
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        let mut data = self.data.lock().unwrap();
        let end = self.pos + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        buf.len()
    }

    fn seek(&mut self, position: u32) {
        self.pos = position as usize;
    }

    fn tell(&self) -> u32 {
        self.pos as u32
    }

    fn length(&self) -> u32 {
        self.data.lock().unwrap().len() as u32
    }
}

/// Flat in-memory file system.
#[derive(Default)]
pub struct FakeFs {
    files: Mutex<BTreeMap<String, (Arc<Mutex<Vec<u8>>>, OpenTracker)>>,
}

impl FakeFs {
    pub fn add(&self, name: &str, contents: &[u8]) {
        self.files.lock().unwrap().insert(
            name.to_string(),
            (Arc::new(Mutex::new(contents.to_vec())), OpenTracker::default()),
        );
    }

    pub fn open_count(&self, name: &str) -> usize {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .map_or(0, |(_, tracker)| tracker.open_count())
    }
}

impl FileSystem for FakeFs {
    fn create(&self, path: &str, initial_size: u32) -> bool {
        let mut files = self.files.lock().unwrap();
        if path.is_empty() || files.contains_key(path) {
            return false;
        }
        files.insert(
            path.to_string(),
            (
                Arc::new(Mutex::new(vec![0; initial_size as usize])),
                OpenTracker::default(),
            ),
        );
        true
    }

    fn remove(&self, path: &str) -> bool {
        self.files.lock().unwrap().remove(path).is_some()
    }

    fn open(&self, path: &str) -> Option<Box<dyn File>> {
        let files = self.files.lock().unwrap();
        let (data, tracker) = files.get(path)?;
        Some(Box::new(MemFile::open(data.clone(), tracker.clone())))
    }
}

/// Console with scripted input and captured output.
pub struct FakeConsole {
    input: Mutex<VecDeque<u8>>,
    output: Mutex<Vec<u8>>,
}

impl FakeConsole {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: Mutex::new(input.iter().copied().collect()),
            output: Mutex::new(Vec::new()),
        }
    }

    pub fn feed(&self, input: &[u8]) {
        self.input.lock().unwrap().extend(input.iter().copied());
    }

    pub fn output(&self) -> Vec<u8> {
        self.output.lock().unwrap().clone()
    }
}

impl Console for FakeConsole {
    fn getc(&self) -> Option<u8> {
        self.input.lock().unwrap().pop_front()
    }

    fn put_buffer(&self, buf: &[u8]) {
        self.output.lock().unwrap().extend_from_slice(buf);
    }
}

#[derive(Default)]
pub struct FakePower {
    off: AtomicBool,
}

impl FakePower {
    pub fn is_off(&self) -> bool {
        self.off.load(Ordering::SeqCst)
    }
}

impl Power for FakePower {
    fn power_off(&self) {
        self.off.store(true, Ordering::SeqCst);
    }
}

/// Loader stand-in: programs whose name starts with `child` load, all
/// others fail.
pub struct FakeProcesses {
    next_pid: Mutex<i32>,
    children: Mutex<BTreeMap<Pid, Process>>,
    load_delay: Mutex<Option<Duration>>,
    spawned: AtomicUsize,
}

impl FakeProcesses {
    pub fn new() -> Self {
        Self {
            next_pid: Mutex::new(2),
            children: Mutex::new(BTreeMap::new()),
            load_delay: Mutex::new(None),
            spawned: AtomicUsize::new(0),
        }
    }

    /// Report loads from a separate thread after `delay`.
    pub fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.lock().unwrap() = Some(delay);
    }

    /// Take the process built for a successfully loaded child.
    pub fn take_child(&self, pid: Pid) -> Option<Process> {
        self.children.lock().unwrap().remove(&pid)
    }

    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

impl ProcessManager for FakeProcesses {
    fn execute(&self, cmdline: &str, link: ChildLink) -> Option<Pid> {
        let name = program_name(cmdline);
        let pid = {
            let mut next = self.next_pid.lock().unwrap();
            let pid = Pid::new(*next);
            *next += 1;
            pid
        };
        self.spawned.fetch_add(1, Ordering::SeqCst);

        let loadable = name.starts_with("child");
        let load = link.load.clone();
        let child = Process::with_parent(pid, name, link);
        match *self.load_delay.lock().unwrap() {
            Some(delay) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    load.report(loadable);
                });
            }
            None => {
                child.report_load(loadable);
            }
        }
        if loadable {
            self.children.lock().unwrap().insert(pid, child);
        }
        Some(pid)
    }
}

/// Top of the fake user stack; requests are written here.
const ESP: u32 = 0xbfff_ff00;
/// Read-only "code" page.
const CODE: u32 = 0x0804_8000;
/// First writable data page.
const HEAP: u32 = 0x0805_0000;
const HEAP_PAGES: u32 = 8;

/// A full set of fake collaborators plus helpers to issue system calls.
pub struct Harness {
    pub memory: FakeMemory,
    pub fs: FakeFs,
    pub console: FakeConsole,
    pub processes: FakeProcesses,
    pub power: FakePower,
    pub io: IoLock,
    brk: Mutex<u32>,
    stacks: Mutex<u32>,
}

impl Harness {
    pub fn new() -> Self {
        crate::sync::install_yield(std::thread::yield_now);

        let memory = FakeMemory::new();
        memory.map(ESP, PageFlags::USER_RW);
        memory.map(CODE, PageFlags::USER_RO);
        for page in 0..HEAP_PAGES {
            memory.map(HEAP + page * PAGE_SIZE as u32, PageFlags::USER_RW);
        }
        Self {
            memory,
            fs: FakeFs::default(),
            console: FakeConsole::new(b""),
            processes: FakeProcesses::new(),
            power: FakePower::default(),
            io: IoLock::new(),
            brk: Mutex::new(HEAP),
            stacks: Mutex::new(ESP),
        }
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            memory: &self.memory,
            fs: &self.fs,
            console: &self.console,
            processes: &self.processes,
            power: &self.power,
            io: &self.io,
        }
    }

    pub fn process(&self, pid: i32, name: &str) -> Process {
        Process::new(Pid::new(pid), name)
    }

    /// Reserve `len` bytes of writable user memory.
    pub fn alloc(&self, len: usize) -> u32 {
        let mut brk = self.brk.lock().unwrap();
        let addr = *brk;
        *brk += len as u32;
        assert!(*brk <= HEAP + HEAP_PAGES * PAGE_SIZE as u32, "fake heap exhausted");
        addr
    }

    pub fn push_bytes(&self, bytes: &[u8]) -> u32 {
        let addr = self.alloc(bytes.len());
        self.memory.poke(addr, bytes);
        addr
    }

    /// Place a NUL-terminated string in user memory.
    pub fn push_str(&self, s: &str) -> u32 {
        let addr = self.alloc(s.len() + 1);
        self.memory.poke(addr, s.as_bytes());
        self.memory.poke(addr + s.len() as u32, &[0]);
        addr
    }

    /// Map a fresh user stack page and return its stack pointer, for
    /// system calls issued concurrently from several threads.
    pub fn stack(&self) -> u32 {
        let mut top = self.stacks.lock().unwrap();
        *top -= PAGE_SIZE as u32;
        self.memory.map(*top, PageFlags::USER_RW);
        *top
    }

    pub fn read_only_page(&self) -> u32 {
        CODE
    }

    pub fn call(&self, process: &mut Process, number: u32, args: &[u32]) -> SyscallOutcome {
        self.call_with_eax(process, number, args, 0).0
    }

    /// Issue a system call with `eax` preset, returning the outcome and the
    /// final `eax`.
    pub fn call_with_eax(
        &self,
        process: &mut Process,
        number: u32,
        args: &[u32],
        eax: u32,
    ) -> (SyscallOutcome, u32) {
        self.call_on_stack(ESP, process, number, args, eax)
    }

    /// Like `call_with_eax`, with the arguments pushed on the stack at `esp`.
    pub fn call_on_stack(
        &self,
        esp: u32,
        process: &mut Process,
        number: u32,
        args: &[u32],
        eax: u32,
    ) -> (SyscallOutcome, u32) {
        let mut words = vec![number];
        words.extend_from_slice(args);
        self.memory.poke_words(esp, &words);
        let mut frame = TrapFrame { esp, eax };
        let outcome = dispatch(&mut frame, process, &self.services());
        (outcome, frame.eax)
    }
}
