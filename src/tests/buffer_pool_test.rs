#[cfg(test)]
pub mod test {
    use crate::storage::page::page::page_constants::PAGE_SIZE;
    use crate::tests::test_bpm;

    const NUM_FRAMES: usize = 10;
    const K_DIST: usize = 2;

    #[test]
    fn saturation() {
        let (_dir, bpm) = test_bpm(2, K_DIST);
        assert_eq!(2, bpm.pool_size());

        let guard_a = bpm.new_page().unwrap();
        let guard_b = bpm.new_page().unwrap();

        // Both frames are pinned; there is nothing to evict.
        assert!(bpm.new_page().is_none());

        drop(guard_a);
        let guard_c = bpm.new_page().unwrap();
        assert_ne!(guard_b.page_id(), guard_c.page_id());
    }

    #[test]
    fn guard_lifetimes_drive_pin_counts() {
        let (_dir, bpm) = test_bpm(NUM_FRAMES, K_DIST);

        let pid_0 = {
            let guard = bpm.new_page().unwrap();
            assert_eq!(Some(1), bpm.get_pin_count(guard.page_id()));
            guard.page_id()
        };
        assert_eq!(Some(0), bpm.get_pin_count(pid_0));

        {
            let _read_a = bpm.fetch_page_read(pid_0).unwrap();
            let _read_b = bpm.fetch_page_read(pid_0).unwrap();
            assert_eq!(Some(2), bpm.get_pin_count(pid_0));
        }
        assert_eq!(Some(0), bpm.get_pin_count(pid_0));

        assert_eq!(None, bpm.get_pin_count(999));
    }

    #[test]
    fn dirty_pages_survive_eviction() {
        let (_dir, bpm) = test_bpm(NUM_FRAMES, K_DIST);

        let mutable_page_id = {
            let mut guard = bpm.new_page().unwrap().upgrade_write();
            guard.data_mut().fill(1);
            guard.page_id()
        };

        // Fill the pool twice over so the mutated page gets evicted.
        for _ in 0..2 * NUM_FRAMES {
            let _ = bpm.new_page().unwrap();
        }
        assert_eq!(None, bpm.get_pin_count(mutable_page_id));

        let guard = bpm.fetch_page_read(mutable_page_id).unwrap();
        assert_eq!(guard.data(), &[1u8; PAGE_SIZE]);
    }

    #[test]
    fn unpin_contract() {
        let (_dir, bpm) = test_bpm(NUM_FRAMES, K_DIST);

        let guard = bpm.new_page().unwrap();
        let page_id = guard.page_id();
        drop(guard);

        // The guard already returned its pin.
        assert!(!bpm.unpin_page(page_id, false));
        // Unknown pages fail too.
        assert!(!bpm.unpin_page(999, false));
    }

    #[test]
    fn flush_clears_the_dirty_bit() {
        let (_dir, bpm) = test_bpm(NUM_FRAMES, K_DIST);

        let page_id = {
            let mut guard = bpm.new_page().unwrap().upgrade_write();
            guard.data_mut().fill(9);
            guard.page_id()
        };

        assert!(bpm.flush_page(page_id));
        // Flushing neither evicts nor unpins.
        assert_eq!(Some(0), bpm.get_pin_count(page_id));

        assert!(!bpm.flush_page(999));

        let guard = bpm.fetch_page_read(page_id).unwrap();
        assert_eq!(guard.data(), &[9u8; PAGE_SIZE]);
    }

    #[test]
    fn flush_all_pages_leaves_residency_alone() {
        let (_dir, bpm) = test_bpm(NUM_FRAMES, K_DIST);

        let mut page_ids = Vec::new();
        for fill in 0..4u8 {
            let mut guard = bpm.new_page().unwrap().upgrade_write();
            guard.data_mut().fill(fill);
            page_ids.push(guard.page_id());
        }

        bpm.flush_all_pages();

        for (fill, &page_id) in page_ids.iter().enumerate() {
            assert_eq!(Some(0), bpm.get_pin_count(page_id));
            let guard = bpm.fetch_page_read(page_id).unwrap();
            assert_eq!(guard.data(), &[fill as u8; PAGE_SIZE]);
        }
    }

    #[test]
    fn delete_page_contract() {
        let (_dir, bpm) = test_bpm(NUM_FRAMES, K_DIST);

        let guard = bpm.new_page().unwrap();
        let pinned_page_id = guard.page_id();

        // Pinned pages cannot be deleted.
        assert!(!bpm.delete_page(pinned_page_id));

        drop(guard);
        assert!(bpm.delete_page(pinned_page_id));
        assert_eq!(None, bpm.get_pin_count(pinned_page_id));

        // Deleting an absent page succeeds trivially.
        assert!(bpm.delete_page(pinned_page_id));

        // The id space is not recycled.
        let next = bpm.new_page().unwrap();
        assert!(next.page_id() > pinned_page_id);
    }

    #[test]
    fn pool_conservation() {
        let (_dir, bpm) = test_bpm(NUM_FRAMES, K_DIST);

        fn assert_conserved(bpm: &crate::buffer::buffer_pool_manager::BufferPoolManager) {
            let (free, resident, _) = bpm.state_counts();
            assert_eq!(NUM_FRAMES, free + resident);
        }

        assert_conserved(&bpm);

        let mut guards = Vec::new();
        for _ in 0..NUM_FRAMES {
            guards.push(bpm.new_page().unwrap());
            assert_conserved(&bpm);
        }
        drop(guards);

        // Evictions replace residents one for one.
        for _ in 0..NUM_FRAMES {
            let _ = bpm.new_page().unwrap();
            assert_conserved(&bpm);
        }

        let (_, resident, evictable) = bpm.state_counts();
        assert_eq!(NUM_FRAMES, resident);
        assert_eq!(NUM_FRAMES, evictable);
    }
}
