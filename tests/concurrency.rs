use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use name_fib::errors::FatalError;
use name_fib::fib::config::{
    BackendConfig, CiscoConfig, MergedBloomConfig, PatriciaConfig, TbfConfig,
};
use name_fib::fib::{Fib, LockedFib};
use name_fib::{Bitmap, Name};

mod common {
    use std::io::Write;

    pub fn init() {
        let _ = env_logger::builder()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .is_test(true)
            .try_init();
    }
}

const PORTS: usize = 16;

fn names(thread: usize) -> Vec<Name> {
    (0..200)
        .filter_map(|i| {
            format!("/site{}/dir{}/file{}", thread, i % 10, i).parse().ok()
        })
        .collect()
}

fn insert_and_lookup<F: Fib + Send + Sync + 'static>(
    fib: LockedFib<F>,
) -> Result<(), Box<dyn std::error::Error>> {
    let handles = (0..4)
        .map(|t| {
            let fib = fib.clone();
            thread::spawn(move || {
                let egress = Bitmap::from_indices(PORTS, [t]);
                for name in names(t) {
                    fib.insert(&name, &egress)?;
                    // our own insert is visible right away
                    let found = fib.lpm(&name)?;
                    assert!(found.is_some_and(|ports| ports.get(t)));
                }
                Ok::<_, name_fib::errors::FatalError>(())
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        match handle.join() {
            Ok(res) => res?,
            Err(_) => return Err("inserting thread panicked".into()),
        }
    }

    for t in 0..4 {
        for name in names(t) {
            assert_eq!(fib.lpm(&name)?, Some(Bitmap::from_indices(PORTS, [t])));
        }
    }

    let stats = fib.stats()?;
    assert_eq!(stats.inserts, 800);
    Ok(())
}

#[test]
fn test_concurrent_inserts_cisco() -> Result<(), Box<dyn std::error::Error>> {
    crate::common::init();

    let config = CiscoConfig { depth: 2 };
    insert_and_lookup(LockedFib::new(config.build()?))
}

#[test]
fn test_concurrent_inserts_tbf() -> Result<(), Box<dyn std::error::Error>> {
    crate::common::init();

    let config = TbfConfig {
        trie_depth: 2,
        seed: Some(7),
        ..Default::default()
    };
    insert_and_lookup(LockedFib::new(config.build()?))
}

#[test]
fn test_readers_during_writes() -> Result<(), Box<dyn std::error::Error>> {
    crate::common::init();

    let fib = LockedFib::new(CiscoConfig::default().build()?);
    let root: Name = "/site0".parse()?;
    fib.insert(&root, &Bitmap::from_indices(PORTS, [15]))?;

    let writer = {
        let fib = fib.clone();
        thread::spawn(move || -> Result<(), name_fib::errors::FatalError> {
            for name in names(0) {
                fib.insert(&name, &Bitmap::from_indices(PORTS, [0]))?;
            }
            Ok(())
        })
    };

    // Every reader sees either the root route or a longer one, never a
    // miss.
    let misses = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let readers = (0..3)
        .map(|_| {
            let fib = fib.clone();
            let misses = Arc::clone(&misses);
            thread::spawn(move || {
                for name in names(0) {
                    if let Ok(None) = fib.lpm(&name) {
                        misses.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    }
                }
            })
        })
        .collect::<Vec<_>>();

    match writer.join() {
        Ok(res) => res?,
        Err(_) => return Err("writer panicked".into()),
    }
    for reader in readers {
        if reader.join().is_err() {
            return Err("reader panicked".into());
        }
    }

    assert_eq!(misses.load(std::sync::atomic::Ordering::Relaxed), 0);
    assert_eq!(fib.stats()?.inserts, 201);
    Ok(())
}

#[test]
fn test_inserts_under_looping_readers(
) -> Result<(), Box<dyn std::error::Error>> {
    crate::common::init();

    let fib = LockedFib::new(PatriciaConfig::default().build()?);
    for t in 0..8 {
        for name in names(t) {
            fib.insert(&name, &Bitmap::from_indices(PORTS, [t]))?;
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    let readers = (0..8)
        .map(|t| {
            let fib = fib.clone();
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let names = names(t);
                while !stop.load(Ordering::Relaxed) {
                    for name in &names {
                        let _ = fib.lpm(name);
                    }
                }
            })
        })
        .collect::<Vec<_>>();

    let (tx, rx) = mpsc::channel();
    let writer = {
        let fib = fib.clone();
        thread::spawn(move || {
            for name in names(8).into_iter().take(100) {
                let egress = Bitmap::from_indices(PORTS, [8]);
                if fib.insert(&name, &egress).is_err() {
                    break;
                }
            }
            let _ = tx.send(());
        })
    };

    let done = rx.recv_timeout(Duration::from_secs(30));
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        if reader.join().is_err() {
            return Err("reader panicked".into());
        }
    }
    if writer.join().is_err() {
        return Err("writer panicked".into());
    }
    assert!(done.is_ok(), "inserts did not finish while readers looped");

    assert_eq!(fib.stats()?.inserts, 8 * 200 + 100);
    Ok(())
}

#[test]
fn test_poisoned_lock_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    crate::common::init();

    let config = MergedBloomConfig {
        ports: 4,
        seed: Some(1),
        ..Default::default()
    };
    let fib = LockedFib::new(config.build()?);
    let name: Name = "/a/b".parse()?;
    fib.insert(&name, &Bitmap::from_indices(4, [1]))?;

    // port 6 does not exist, the insert panics while holding the lock
    let panicked = {
        let fib = fib.clone();
        let name = name.clone();
        thread::spawn(move || {
            let _ = fib.insert(&name, &Bitmap::from_indices(8, [6]));
        })
        .join()
        .is_err()
    };
    assert!(panicked);

    assert_eq!(fib.lpm(&name), Err(FatalError));
    assert_eq!(
        fib.insert(&name, &Bitmap::from_indices(4, [2])),
        Err(FatalError)
    );
    assert!(matches!(fib.stats(), Err(FatalError)));
    Ok(())
}
