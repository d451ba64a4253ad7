#![no_std]
extern crate alloc;
extern crate pagecache_rs;

use pagecache_rs::error::Result;
use pagecache_rs::page::config::PageCacheConfig;
use pagecache_rs::page::fifo::FifoCache;
use pagecache_rs::page::lru::LruCache;
use pagecache_rs::page::record::Record;
use pagecache_rs::page::writer::{CacheWriter, NullTrace, Trace};
use pagecache_rs::page::Cache;

#[derive(Clone)]
struct Page {
    pos: i32,
    memory: i32,
    changed: bool,
}

impl Record for Page {
    fn pos(&self) -> i32 {
        self.pos
    }
    fn memory(&self) -> i32 {
        self.memory
    }
    fn is_changed(&self) -> bool {
        self.changed
    }
    fn can_remove(&self) -> bool {
        true
    }
}

struct CountingWriter {
    writebacks: u32,
    trace: NullTrace,
}

impl CacheWriter<Page> for CountingWriter {
    fn flush_log(&mut self) -> Result<()> {
        Ok(())
    }
    fn write_back(&mut self, _record: &Page) -> Result<()> {
        self.writebacks += 1;
        Ok(())
    }
    fn trace(&self) -> &dyn Trace {
        &self.trace
    }
}

#[test]
fn test_lru_in_no_std() {
    let writer = CountingWriter {
        writebacks: 0,
        trace: NullTrace,
    };
    let mut cache = LruCache::new(PageCacheConfig::new(16), writer).unwrap();

    for pos in 0..20 {
        cache
            .put(Page {
                pos,
                memory: 1024,
                changed: true,
            })
            .unwrap();
    }

    assert!(cache.find(19).is_some());
    assert!(cache.find(0).is_none());
}

#[test]
fn test_fifo_in_no_std() {
    let writer = CountingWriter {
        writebacks: 0,
        trace: NullTrace,
    };
    let mut cache = FifoCache::new(PageCacheConfig::new(16), writer).unwrap();

    cache
        .put(Page {
            pos: 1,
            memory: 4,
            changed: false,
        })
        .unwrap();

    assert!(cache.find(1).is_some());
    assert!(cache.remove(1));
    assert!(cache.find(1).is_none());
}
