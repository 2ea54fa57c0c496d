// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `understory_composite_list` crate.
//!
//! These drive `CompositeList` end to end with a recording host, focusing on
//! how segment offsets, queued list events, and collection replacement turn
//! into host notifications.

use understory_composite_list::{
    CompositeList, Error, ListHandle, ListHost, ListSpec, ListUpdate, Mutation, ObservableList,
    Resolved, SegmentSpec, SingleHandle, ViewType,
};

/// Records notifications and mirrors the item count they imply.
#[derive(Debug, Default)]
struct Recorder {
    refreshes: usize,
    len: usize,
    updates: Vec<ListUpdate>,
}

impl Recorder {
    fn take(&mut self) -> Vec<ListUpdate> {
        std::mem::take(&mut self.updates)
    }
}

impl ListHost for Recorder {
    fn request_full_refresh(&mut self) {
        self.refreshes += 1;
    }

    fn notify_changed(&mut self, start: usize, count: usize) {
        self.updates.push(ListUpdate::Changed { start, count });
    }

    fn notify_inserted(&mut self, start: usize, count: usize) {
        self.len += count;
        self.updates.push(ListUpdate::Inserted { start, count });
    }

    fn notify_removed(&mut self, start: usize, count: usize) {
        self.len -= count;
        self.updates.push(ListUpdate::Removed { start, count });
    }

    fn notify_moved(&mut self, from: usize, to: usize) {
        self.updates.push(ListUpdate::Moved { from, to });
    }
}

type Engine = CompositeList<(), Recorder>;

fn fixed(list: &mut Engine) -> SingleHandle<()> {
    list.register_single(SegmentSpec::fixed(|| (), |_| ()))
}

fn numbers(list: &mut Engine) -> ListHandle<u32> {
    list.register_list(ListSpec::new(|| (), |_| 0_u32, |row: &mut u32, item: &u32| {
        *row = *item;
    }))
}

/// Header, a list holding `items`, and footer, with the host in sync.
fn framed(items: Vec<u32>) -> (Engine, ListHandle<u32>, ObservableList<u32>) {
    let mut list = Engine::default();
    let _ = fixed(&mut list);
    let rows = numbers(&mut list);
    let _ = fixed(&mut list);
    let items = ObservableList::from(items);
    list.update_list(rows, items.clone(), None).unwrap();
    let count = list.item_count();
    let host = list.host_mut();
    host.len = count;
    host.take();
    (list, rows, items)
}

#[test]
fn single_then_list_resolves_positions() {
    let mut list = Engine::default();
    let title = list.register_single(
        SegmentSpec::new(|| (), |_| String::new())
            .with_binder(|label: &mut String, value: &String| label.clone_from(value)),
    );
    let rows = numbers(&mut list);
    assert_eq!(list.host().refreshes, 2);

    list.update_single(title, "A".to_string()).unwrap();
    list.update_list(rows, ObservableList::from(vec![1, 2, 3]), None)
        .unwrap();

    assert_eq!(list.item_count(), 4);
    assert_eq!(
        list.resolve_position(0),
        Ok(Resolved {
            segment: 0,
            local: 0
        })
    );
    assert_eq!(
        list.resolve_position(2),
        Ok(Resolved {
            segment: 1,
            local: 1
        })
    );
    assert_eq!(list.view_type(0), Ok(title.view_type()));
    for position in 1..4 {
        assert_eq!(list.view_type(position), Ok(rows.view_type()));
    }
    assert_eq!(
        list.resolve_position(4),
        Err(Error::OutOfRange {
            position: 4,
            len: 4
        })
    );
    assert_eq!(list.offset_of(rows.view_type()), Ok(1));
    assert_eq!(
        list.host().updates,
        [
            ListUpdate::Changed { start: 0, count: 1 },
            ListUpdate::Changed { start: 1, count: 0 },
            ListUpdate::Inserted { start: 1, count: 3 },
        ]
    );
}

#[test]
fn insert_at_front_is_reported_at_the_segment_offset() {
    let (mut list, rows, items) = framed(vec![1, 2, 3, 4, 5]);

    items.insert(0, 0).unwrap();
    assert_eq!(list.flush(), Ok(1));
    assert_eq!(
        list.host_mut().take(),
        [ListUpdate::Inserted { start: 1, count: 1 }]
    );

    assert_eq!(list.segment_item_count(rows.view_type()), Some(6));
    let footer = ViewType::from_index(2);
    assert_eq!(list.offset_of(footer), Ok(7));
    assert_eq!(list.view_type(7), Ok(footer));
    assert_eq!(list.host().len, list.item_count());
}

#[test]
fn new_collection_is_diffed_against_the_previous_one() {
    let (mut list, rows, old) = framed(vec![1, 2, 3]);

    list.update_list(rows, ObservableList::from(vec![2, 3, 4]), None)
        .unwrap();
    assert_eq!(
        list.host_mut().take(),
        [
            ListUpdate::Removed { start: 1, count: 1 },
            ListUpdate::Inserted { start: 3, count: 1 },
        ]
    );

    // The replaced collection is no longer observed.
    old.push(9);
    assert_eq!(list.flush(), Ok(0));
    assert!(list.host().updates.is_empty());
    assert_eq!(list.list(rows).map(|l| l.to_vec()), Some(vec![2, 3, 4]));
}

#[test]
fn same_collection_is_reported_by_count() {
    let (mut list, rows, items) = framed(vec![1, 2, 3]);

    list.update_list(rows, items.clone(), None).unwrap();
    assert_eq!(
        list.host_mut().take(),
        [ListUpdate::Changed { start: 1, count: 3 }]
    );

    list.refresh_list(rows).unwrap();
    assert_eq!(
        list.host_mut().take(),
        [ListUpdate::Changed { start: 1, count: 3 }]
    );
}

#[test]
fn range_moves_replay_to_the_new_order() {
    let (mut list, _, items) = framed(vec![0, 1, 2, 3, 4]);
    let mut mirror: Vec<Option<u32>> = std::iter::once(None)
        .chain(items.to_vec().into_iter().map(Some))
        .chain(std::iter::once(None))
        .collect();

    items.move_range(0, 3, 2).unwrap();
    items.move_range(4, 1, 1).unwrap();
    list.flush().unwrap();

    for update in list.host_mut().take() {
        let ListUpdate::Moved { from, to } = update else {
            panic!("unexpected update {update:?}");
        };
        let item = mirror.remove(from);
        mirror.insert(to, item);
    }
    let expected: Vec<Option<u32>> = std::iter::once(None)
        .chain(items.to_vec().into_iter().map(Some))
        .chain(std::iter::once(None))
        .collect();
    assert_eq!(mirror, expected);
}

#[test]
fn replacements_report_prefix_and_size_change() {
    let (mut list, _, items) = framed(vec![1, 2, 3]);

    items.replace_range(1..3, [7]).unwrap();
    items.set(0, 5).unwrap();
    items.replace_range(1..1, [8, 9]).unwrap();
    assert_eq!(list.flush(), Ok(3));
    assert_eq!(
        list.host_mut().take(),
        [
            ListUpdate::Changed { start: 1, count: 1 },
            ListUpdate::Removed { start: 2, count: 1 },
            ListUpdate::Changed { start: 1, count: 0 },
            ListUpdate::Changed { start: 1, count: 1 },
            ListUpdate::Inserted { start: 2, count: 2 },
        ]
    );
    assert_eq!(items.to_vec(), [5, 8, 9, 7]);
    assert_eq!(list.host().len, list.item_count());
}

#[test]
fn replace_without_start_is_rejected() {
    let (mut list, rows, _) = framed(vec![1]);
    let mutation = Mutation::Replace {
        start: None,
        old_count: 1,
        new_count: 1,
    };
    assert_eq!(
        list.update_list(rows, ObservableList::from(vec![2]), Some(mutation)),
        Err(Error::UnsupportedMutation { mutation })
    );
}

#[test]
fn content_changes_use_the_segment_predicates() {
    let mut list = CompositeList::<(), Recorder>::default();
    let rows = list.register_list(
        ListSpec::new(|| (), |_| (), |_: &mut (), _: &(u32, &'static str)| {})
            .with_identity(|a, b| a.0 == b.0),
    );
    list.update_list(rows, ObservableList::from(vec![(1, "a"), (2, "b")]), None)
        .unwrap();
    list.host_mut().take();

    list.update_list(
        rows,
        ObservableList::from(vec![(1, "a"), (2, "B"), (3, "c")]),
        None,
    )
    .unwrap();
    assert_eq!(
        list.host_mut().take(),
        [
            ListUpdate::Changed { start: 1, count: 1 },
            ListUpdate::Inserted { start: 2, count: 1 },
        ]
    );
}

#[derive(Debug, Default)]
struct Label {
    text: String,
    watched: Option<String>,
}

#[derive(Debug, Default)]
struct Row {
    value: u32,
    watched: Option<u32>,
}

#[test]
fn holders_bind_and_subscribe_to_live_values() {
    let mut list = CompositeList::<(), Recorder>::default();
    let title = list.register_single(
        SegmentSpec::new(|| (), |_| Label::default())
            .with_binder(|label: &mut Label, value: &String| label.text.clone_from(value))
            .with_subscriptions(
                |label: &mut Label, value| label.watched = value.get(),
                |label: &mut Label| label.watched = None,
            ),
    );
    let rows = list.register_list(
        ListSpec::new(|| (), |_| Row::default(), |row: &mut Row, item: &u32| {
            row.value = *item;
        })
        .with_subscriptions(
            |row: &mut Row, value| row.watched = value.get(),
            |row: &mut Row| row.watched = None,
        ),
    );
    let items = ObservableList::from(vec![10, 20, 30]);
    list.update_list(rows, items.clone(), None).unwrap();

    let mut header = list.create_holder(title.view_type()).unwrap();
    list.bind(&mut header, 0).unwrap();
    list.on_attach(&mut header).unwrap();
    assert_eq!(header.get::<Label>().unwrap().text, "");
    assert_eq!(header.get::<Label>().unwrap().watched, None);

    list.update_single(title, "Hi".to_string()).unwrap();
    list.bind(&mut header, 0).unwrap();
    list.on_attach(&mut header).unwrap();
    assert_eq!(header.get::<Label>().unwrap().text, "Hi");
    assert_eq!(header.get::<Label>().unwrap().watched.as_deref(), Some("Hi"));
    list.on_detach(&mut header).unwrap();
    assert_eq!(header.get::<Label>().unwrap().watched, None);

    let mut row = list.create_holder(rows.view_type()).unwrap();
    list.bind(&mut row, 2).unwrap();
    assert_eq!(row.bound_index(), Some(1));
    assert_eq!(row.get::<Row>().unwrap().value, 20);
    list.on_attach(&mut row).unwrap();
    assert_eq!(row.get::<Row>().unwrap().watched, Some(20));

    items.set(1, 25).unwrap();
    list.on_attach(&mut row).unwrap();
    assert_eq!(row.get::<Row>().unwrap().watched, Some(25));
    list.on_detach(&mut row).unwrap();
    assert_eq!(row.get::<Row>().unwrap().watched, None);
}

#[test]
fn holder_misuse_is_an_invalid_argument() {
    let (list, rows, _) = framed(vec![1, 2]);
    let mut header = list.create_holder(ViewType::from_index(0)).unwrap();
    assert!(matches!(
        list.bind(&mut header, 1),
        Err(Error::InvalidArgument { .. })
    ));
    let mut row = list.create_holder(rows.view_type()).unwrap();
    assert!(matches!(
        list.bind(&mut row, 9),
        Err(Error::OutOfRange { .. })
    ));
    assert!(list.create_holder(ViewType::from_index(5)).is_err());
}

#[test]
fn single_values_keep_their_predecessor() {
    let mut list = CompositeList::<(), Recorder>::default();
    let count = list.register_single(SegmentSpec::<(), (), u32>::new(|| (), |_| ()));
    assert_eq!(list.value(count), None);
    list.update_single(count, 1).unwrap();
    list.update_single(count, 2).unwrap();
    assert_eq!(list.value(count), Some(2));
    assert_eq!(list.previous_value(count), Some(1));
    assert_eq!(
        list.host().updates,
        [
            ListUpdate::Changed { start: 0, count: 1 },
            ListUpdate::Changed { start: 0, count: 1 },
        ]
    );
}

#[test]
fn host_count_tracks_a_mixed_session() {
    let (mut list, rows, items) = framed(vec![1, 2, 3]);

    items.push(4);
    items.remove(0).unwrap();
    items.insert_many(2, [7, 8, 9]).unwrap();
    items.remove_range(0..2).unwrap();
    list.flush().unwrap();
    assert_eq!(list.host().len, list.item_count());

    items.clear();
    list.flush().unwrap();
    assert_eq!(list.host().len, list.item_count());
    assert_eq!(list.segment_item_count(rows.view_type()), Some(0));

    list.update_list(rows, ObservableList::from(vec![5, 6]), None)
        .unwrap();
    list.update_list(
        rows,
        ObservableList::from(vec![5, 6, 7]),
        Some(Mutation::Insert { start: 2, count: 1 }),
    )
    .unwrap();
    assert_eq!(list.host().len, list.item_count());
    assert_eq!(list.item_count(), 5);
}
