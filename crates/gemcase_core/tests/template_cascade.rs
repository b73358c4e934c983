use gemcase_core::model::item::{FieldKind, FieldValue, ItemId};
use gemcase_core::query;
use gemcase_core::service::{catalog_service, template_service, CascadeError};
use gemcase_core::store::ItemStore;

fn column_orders(store: &ItemStore, column: ItemId) -> Vec<u32> {
    query::sorted_column_fields(store, column)
        .unwrap()
        .into_iter()
        .map(|field| store.template_field(field).unwrap().column_order)
        .collect()
}

fn assert_dense(store: &ItemStore, column: ItemId) {
    let orders = column_orders(store, column);
    let expected: Vec<u32> = (0..orders.len() as u32).collect();
    assert_eq!(orders, expected, "column {column} order must be dense");
}

#[test]
fn add_field_materializes_one_entry_field_per_existing_entry() {
    let mut store = ItemStore::new();
    let template = catalog_service::add_template(&mut store, "Minerals", false).unwrap();
    let column = query::template_columns(&store, template).unwrap()[0];
    let shelf = catalog_service::add_collection(&mut store, "Shelf", "", template).unwrap();
    let drawer = catalog_service::add_collection(&mut store, "Drawer", "", template).unwrap();
    let quartz = catalog_service::add_entry(&mut store, "Quartz", shelf, &[]).unwrap();
    let calcite = catalog_service::add_entry(&mut store, "Calcite", drawer, &[]).unwrap();

    let before_quartz = query::entry_fields(&store, quartz).unwrap().len();
    let field =
        template_service::add_field(&mut store, template, column, "Origin", FieldKind::Text)
            .unwrap();

    for entry in [quartz, calcite] {
        let fields = query::entry_fields(&store, entry).unwrap();
        let bound: Vec<ItemId> = fields
            .iter()
            .filter(|&&entry_field| {
                store.entry_field(entry_field).unwrap().template_field == field
            })
            .copied()
            .collect();
        assert_eq!(bound.len(), 1, "exactly one new entry field per entry");
        assert_eq!(
            store.entry_field(bound[0]).unwrap().value,
            FieldValue::Text(String::new())
        );
    }
    assert_eq!(
        query::entry_fields(&store, quartz).unwrap().len(),
        before_quartz + 1
    );
    assert_dense(&store, column);
}

#[test]
fn money_fields_start_as_an_empty_two_part_tuple() {
    let mut store = ItemStore::new();
    let template = catalog_service::add_template(&mut store, "Minerals", false).unwrap();
    let column = query::template_columns(&store, template).unwrap()[0];
    let shelf = catalog_service::add_collection(&mut store, "Shelf", "", template).unwrap();
    let entry = catalog_service::add_entry(&mut store, "Quartz", shelf, &[]).unwrap();

    let field =
        template_service::add_field(&mut store, template, column, "Value", FieldKind::MoneyUsd)
            .unwrap();

    let bound = query::entry_fields(&store, entry)
        .unwrap()
        .into_iter()
        .find(|&entry_field| store.entry_field(entry_field).unwrap().template_field == field)
        .unwrap();
    assert_eq!(
        store.entry_field(bound).unwrap().value,
        FieldValue::Money([String::new(), String::new()])
    );
}

#[test]
fn delete_field_cascades_and_closes_the_order_gap() {
    let mut store = ItemStore::new();
    let template = catalog_service::add_template(&mut store, "Minerals", false).unwrap();
    let column = query::template_columns(&store, template).unwrap()[0];
    let name =
        template_service::add_field(&mut store, template, column, "Name", FieldKind::Text).unwrap();
    let origin =
        template_service::add_field(&mut store, template, column, "Origin", FieldKind::Text)
            .unwrap();
    let shelf = catalog_service::add_collection(&mut store, "Shelf", "", template).unwrap();
    let entry = catalog_service::add_entry(&mut store, "Quartz", shelf, &[]).unwrap();

    template_service::delete_field(&mut store, name).unwrap();

    assert!(store.template_field(name).is_err());
    let remaining = query::entry_fields(&store, entry).unwrap();
    assert!(remaining
        .iter()
        .all(|&entry_field| store.entry_field(entry_field).unwrap().template_field != name));
    assert_dense(&store, column);
    // Origin slid up into the gap left by Name.
    assert_eq!(store.template_field(origin).unwrap().column_order, 0);
}

#[test]
fn reserved_entry_images_field_cannot_be_deleted_or_retyped() {
    let mut store = ItemStore::new();
    let template = catalog_service::add_template(&mut store, "Minerals", false).unwrap();
    let column = query::template_columns(&store, template).unwrap()[0];
    let images = template_service::add_field(
        &mut store,
        template,
        column,
        "Images",
        FieldKind::EntryImages,
    )
    .unwrap();

    // A template carries at most one entry-images field.
    assert!(matches!(
        template_service::add_field(&mut store, template, column, "More", FieldKind::EntryImages),
        Err(CascadeError::Validation(_))
    ));

    assert!(matches!(
        template_service::delete_field(&mut store, images),
        Err(CascadeError::ReservedField(id)) if id == images
    ));
    assert!(store.template_field(images).is_ok(), "field must survive");

    assert!(matches!(
        template_service::retype_field(&mut store, images, FieldKind::Text),
        Err(CascadeError::ReservedField(_))
    ));
    let name =
        template_service::add_field(&mut store, template, column, "Name", FieldKind::Text).unwrap();
    assert!(matches!(
        template_service::retype_field(&mut store, name, FieldKind::EntryImages),
        Err(CascadeError::Validation(_))
    ));
}

#[test]
fn swap_keeps_orders_dense_and_duplicate_free() {
    let mut store = ItemStore::new();
    let template = catalog_service::add_template(&mut store, "Minerals", false).unwrap();
    let column = query::template_columns(&store, template).unwrap()[0];
    let name =
        template_service::add_field(&mut store, template, column, "Name", FieldKind::Text).unwrap();
    let origin =
        template_service::add_field(&mut store, template, column, "Origin", FieldKind::Text)
            .unwrap();

    template_service::swap_fields(&mut store, name, origin).unwrap();
    assert_dense(&store, column);
    assert_eq!(store.template_field(name).unwrap().column_order, 1);
    assert_eq!(store.template_field(origin).unwrap().column_order, 0);

    // Swapping across columns is rejected.
    template_service::set_column_count(&mut store, template, true).unwrap();
    let second = query::template_columns(&store, template).unwrap()[1];
    let notes = template_service::add_field(&mut store, template, second, "Notes", FieldKind::Text)
        .unwrap();
    assert!(matches!(
        template_service::swap_fields(&mut store, name, notes),
        Err(CascadeError::Validation(_))
    ));
}

#[test]
fn move_field_appends_to_the_other_column_and_renumbers_both() {
    let mut store = ItemStore::new();
    let template = catalog_service::add_template(&mut store, "Minerals", true).unwrap();
    let columns = query::template_columns(&store, template).unwrap();
    let (first, second) = (columns[0], columns[1]);
    let name =
        template_service::add_field(&mut store, template, first, "Name", FieldKind::Text).unwrap();
    let origin =
        template_service::add_field(&mut store, template, first, "Origin", FieldKind::Text)
            .unwrap();
    let notes =
        template_service::add_field(&mut store, template, second, "Notes", FieldKind::Text)
            .unwrap();

    template_service::move_field(&mut store, name).unwrap();

    let moved = store.template_field(name).unwrap();
    assert_eq!(moved.column, second);
    assert_eq!(moved.column_order, 1, "appended after existing fields");
    assert_eq!(store.template_field(notes).unwrap().column_order, 0);
    // Source column closed the gap left by Name.
    assert_eq!(store.template_field(origin).unwrap().column_order, 0);
    assert_dense(&store, first);
    assert_dense(&store, second);
}

#[test]
fn move_field_requires_a_two_column_template() {
    let mut store = ItemStore::new();
    let template = catalog_service::add_template(&mut store, "Minerals", false).unwrap();
    let column = query::template_columns(&store, template).unwrap()[0];
    let name =
        template_service::add_field(&mut store, template, column, "Name", FieldKind::Text).unwrap();

    assert!(matches!(
        template_service::move_field(&mut store, name),
        Err(CascadeError::Validation(_))
    ));
}

#[test]
fn switching_to_one_column_merges_with_dense_order() {
    let mut store = ItemStore::new();
    let template = catalog_service::add_template(&mut store, "Minerals", true).unwrap();
    let columns = query::template_columns(&store, template).unwrap();
    let (first, second) = (columns[0], columns[1]);
    template_service::add_field(&mut store, template, first, "Name", FieldKind::Text).unwrap();
    let notes =
        template_service::add_field(&mut store, template, second, "Notes", FieldKind::Text)
            .unwrap();
    let link =
        template_service::add_field(&mut store, template, second, "Link", FieldKind::Hyperlink)
            .unwrap();

    template_service::set_column_count(&mut store, template, false).unwrap();

    assert!(!store.template(template).unwrap().two_columns);
    assert!(query::template_column_fields(&store, second)
        .unwrap()
        .is_empty());
    let merged = query::sorted_column_fields(&store, first).unwrap();
    // Name, then the former column-2 fields in their old order.
    assert_eq!(merged.len(), 3);
    assert_eq!(merged[1], notes);
    assert_eq!(merged[2], link);
    assert_dense(&store, first);
}

#[test]
fn retype_resets_every_bound_entry_field_to_the_new_default() {
    let mut store = ItemStore::new();
    let template = catalog_service::add_template(&mut store, "Minerals", false).unwrap();
    let column = query::template_columns(&store, template).unwrap()[0];
    let value =
        template_service::add_field(&mut store, template, column, "Value", FieldKind::Text)
            .unwrap();
    let shelf = catalog_service::add_collection(&mut store, "Shelf", "", template).unwrap();
    let entry = catalog_service::add_entry(&mut store, "Quartz", shelf, &[]).unwrap();

    let bound = query::entry_fields(&store, entry)
        .unwrap()
        .into_iter()
        .find(|&entry_field| store.entry_field(entry_field).unwrap().template_field == value)
        .unwrap();
    catalog_service::set_entry_field_value(
        &mut store,
        bound,
        FieldValue::Text("priceless".to_string()),
    )
    .unwrap();

    template_service::retype_field(&mut store, value, FieldKind::MoneyUsd).unwrap();

    assert_eq!(store.template_field(value).unwrap().kind, FieldKind::MoneyUsd);
    assert_eq!(
        store.entry_field(bound).unwrap().value,
        FieldValue::Money([String::new(), String::new()])
    );
}

#[test]
fn delete_template_cascades_leaves_first_to_everything_dependent() {
    let mut store = ItemStore::new();
    catalog_service::new_project(&mut store, "specimens").unwrap();
    let template = catalog_service::add_template(&mut store, "Minerals", true).unwrap();
    let shelf = catalog_service::add_collection(&mut store, "Shelf", "", template).unwrap();
    let favorites = catalog_service::add_grouping(&mut store, "favorites", shelf).unwrap();
    let quartz = catalog_service::add_entry(&mut store, "Quartz", shelf, &[favorites]).unwrap();
    let columns = query::template_columns(&store, template).unwrap();

    template_service::delete_template(&mut store, template).unwrap();

    assert!(store.template(template).is_err());
    assert!(store.collection(shelf).is_err());
    assert!(store.grouping(favorites).is_err());
    assert!(store.entry(quartz).is_err());
    for column in columns {
        assert!(store.template_column(column).is_err());
    }
    // Only the database item survives.
    assert_eq!(store.len(), 1);
}

#[test]
fn collections_using_names_every_dependent_collection() {
    let mut store = ItemStore::new();
    let template = catalog_service::add_template(&mut store, "Minerals", false).unwrap();
    let shelf = catalog_service::add_collection(&mut store, "Shelf", "", template).unwrap();
    let drawer = catalog_service::add_collection(&mut store, "Drawer", "", template).unwrap();

    let uses = template_service::collections_using(&store, template).unwrap();
    assert_eq!(
        uses,
        vec![
            (shelf, "Shelf".to_string()),
            (drawer, "Drawer".to_string())
        ]
    );
}

// The end-to-end scenario from the catalog requirements: a one-column
// template with Name and Value, one collection, one entry, then a field
// delete that must reach the entry.
#[test]
fn rocks_scenario_add_entry_then_delete_value_field() {
    let mut store = ItemStore::new();
    catalog_service::new_project(&mut store, "rocks").unwrap();
    let rocks = catalog_service::add_template(&mut store, "Rocks", false).unwrap();
    let column = query::template_columns(&store, rocks).unwrap()[0];
    let name =
        template_service::add_field(&mut store, rocks, column, "Name", FieldKind::Text).unwrap();
    let value =
        template_service::add_field(&mut store, rocks, column, "Value", FieldKind::MoneyUsd)
            .unwrap();
    let my_rocks = catalog_service::add_collection(&mut store, "MyRocks", "", rocks).unwrap();
    let quartz = catalog_service::add_entry(&mut store, "Quartz", my_rocks, &[]).unwrap();

    // One entry field per template field.
    let fields = query::entry_fields(&store, quartz).unwrap();
    assert_eq!(fields.len(), 2);
    let value_field = fields
        .iter()
        .find(|&&entry_field| store.entry_field(entry_field).unwrap().template_field == value)
        .copied()
        .unwrap();
    assert_eq!(
        store.entry_field(value_field).unwrap().value,
        FieldValue::Money([String::new(), String::new()])
    );

    template_service::delete_field(&mut store, value).unwrap();

    let remaining = query::entry_fields(&store, quartz).unwrap();
    assert_eq!(remaining.len(), 1, "only Name remains");
    assert!(remaining
        .iter()
        .any(|&entry_field| store.entry_field(entry_field).unwrap().template_field == name));
    assert!(!query::template_column_fields(&store, column)
        .unwrap()
        .contains(&value));
}
