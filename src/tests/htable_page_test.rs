#[cfg(test)]
pub mod test {
    use crate::storage::page::htable_bucket_page::HtableBucketPage;
    use crate::storage::page::htable_directory_page::HtableDirectoryPage;
    use crate::storage::page::htable_header_page::HtableHeaderPage;
    use crate::storage::page::page::page_constants::{INVALID_PAGE_ID, PAGE_SIZE};
    use crate::utils::hash_util::OrdComparator;

    #[test]
    fn header_routes_on_the_top_bits() {
        let header = HtableHeaderPage::init(2);

        assert_eq!(0, header.hash_to_directory_index(0x0000_0000));
        assert_eq!(1, header.hash_to_directory_index(0x5000_0000));
        assert_eq!(2, header.hash_to_directory_index(0x8000_0000));
        assert_eq!(3, header.hash_to_directory_index(0xf000_0000));

        // A zero-depth header has exactly one slot.
        let flat = HtableHeaderPage::init(0);
        assert_eq!(0, flat.hash_to_directory_index(u32::MAX));
        assert_eq!(1, flat.max_size());
    }

    #[test]
    fn header_round_trips_through_a_page() {
        let mut header = HtableHeaderPage::init(2);
        header.set_directory_page_id(0, 12);
        header.set_directory_page_id(3, 34);

        let mut page = [0u8; PAGE_SIZE];
        header.encode(&mut page);

        let decoded = HtableHeaderPage::decode(&page);
        assert_eq!(2, decoded.max_depth());
        assert_eq!(12, decoded.directory_page_id(0));
        assert_eq!(INVALID_PAGE_ID, decoded.directory_page_id(1));
        assert_eq!(INVALID_PAGE_ID, decoded.directory_page_id(2));
        assert_eq!(34, decoded.directory_page_id(3));
    }

    #[test]
    fn directory_grow_copies_split_images() {
        let mut directory = HtableDirectoryPage::init(3);
        assert_eq!(1, directory.size());
        assert_eq!(0, directory.hash_to_bucket_index(0xdead_beef));

        directory.set_bucket_page_id(0, 7);
        directory.set_local_depth(0, 0);

        directory.incr_global_depth();
        assert_eq!(2, directory.size());
        // The new slot aliases the same bucket at the same depth.
        assert_eq!(7, directory.bucket_page_id(1));
        assert_eq!(0, directory.local_depth(1));
        directory.verify_integrity();

        // Simulate a split of bucket 0.
        directory.set_bucket_page_id(1, 9);
        directory.set_local_depth(0, 1);
        directory.set_local_depth(1, 1);
        directory.verify_integrity();

        directory.incr_global_depth();
        assert_eq!(4, directory.size());
        assert_eq!(7, directory.bucket_page_id(2));
        assert_eq!(9, directory.bucket_page_id(3));
        directory.verify_integrity();

        assert_eq!(3, directory.hash_to_bucket_index(0b1011));
    }

    #[test]
    fn directory_shrinks_only_when_no_bucket_needs_the_depth() {
        let mut directory = HtableDirectoryPage::init(3);
        directory.set_bucket_page_id(0, 7);
        directory.incr_global_depth();
        directory.set_bucket_page_id(1, 9);
        directory.set_local_depth(0, 1);
        directory.set_local_depth(1, 1);

        assert!(!directory.can_shrink());

        // Merge the two buckets back together.
        directory.set_bucket_page_id(1, 7);
        directory.set_local_depth(0, 0);
        directory.set_local_depth(1, 0);
        assert!(directory.can_shrink());

        directory.decr_global_depth();
        assert_eq!(1, directory.size());
        assert!(!directory.can_shrink());
        directory.verify_integrity();
    }

    #[test]
    fn directory_round_trips_through_a_page() {
        let mut directory = HtableDirectoryPage::init(4);
        directory.set_bucket_page_id(0, 5);
        directory.incr_global_depth();
        directory.set_bucket_page_id(1, 6);
        directory.set_local_depth(0, 1);
        directory.set_local_depth(1, 1);

        let mut page = [0u8; PAGE_SIZE];
        directory.encode(&mut page);

        let decoded = HtableDirectoryPage::decode(&page);
        assert_eq!(4, decoded.max_depth());
        assert_eq!(16, decoded.max_size());
        assert_eq!(1, decoded.global_depth());
        assert_eq!(5, decoded.bucket_page_id(0));
        assert_eq!(6, decoded.bucket_page_id(1));
        assert_eq!(1, decoded.local_depth(0));
        decoded.verify_integrity();
    }

    #[test]
    fn bucket_capacity_is_derived_from_the_entry_width() {
        // (4096 - 8) / (4 + 4)
        assert_eq!(511, HtableBucketPage::<i32, i32>::capacity());
        // (4096 - 8) / (8 + 8)
        assert_eq!(255, HtableBucketPage::<i64, u64>::capacity());

        // An oversized configuration is clamped.
        let bucket = HtableBucketPage::<i32, i32>::init(100_000);
        assert_eq!(511, bucket.max_size());
    }

    #[test]
    fn bucket_is_a_set_of_unique_keys() {
        let cmp = OrdComparator;
        let mut bucket = HtableBucketPage::<i32, i32>::init(2);

        assert!(bucket.insert(&1, &10, &cmp));
        assert!(!bucket.insert(&1, &11, &cmp), "duplicate key must fail");
        assert_eq!(Some(&10), bucket.lookup(&1, &cmp));

        assert!(bucket.insert(&2, &20, &cmp));
        assert!(bucket.is_full());
        assert!(!bucket.insert(&3, &30, &cmp), "full bucket must fail");

        assert!(bucket.remove(&1, &cmp));
        assert!(!bucket.remove(&1, &cmp), "second remove is a no-op");
        assert_eq!(None, bucket.lookup(&1, &cmp));
        assert_eq!(Some(&20), bucket.lookup(&2, &cmp));
    }

    #[test]
    fn bucket_round_trips_through_a_page() {
        let cmp = OrdComparator;
        let mut bucket = HtableBucketPage::<i64, u64>::init(8);
        for key in 0..5i64 {
            assert!(bucket.insert(&key, &((key * 100) as u64), &cmp));
        }

        let mut page = [0u8; PAGE_SIZE];
        bucket.encode(&mut page);

        let decoded = HtableBucketPage::<i64, u64>::decode(&page);
        assert_eq!(5, decoded.size());
        assert_eq!(8, decoded.max_size());
        for key in 0..5i64 {
            assert_eq!(Some(&((key * 100) as u64)), decoded.lookup(&key, &cmp));
        }
    }
}
