use crate::models::{AvailableStorage, Location, Organization, Storage, WasteAmount};

/// Euclidean distance between two locations
pub fn distance(a: Location, b: Location) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Check whether `storage` can take every requested amount.
///
/// For each item the free margin is `capacity - current_level` for its type.
/// A type with no capacity entry has capacity zero and a type with no level
/// entry has level zero. Stops at the first item that does not fit.
pub fn has_sufficient_capacity<'a, I>(storage: &Storage, requested: I) -> bool
where
    I: IntoIterator<Item = &'a WasteAmount>,
{
    requested.into_iter().all(|item| {
        let capacity = i64::from(storage.capacity_for(item.waste_type).unwrap_or(0));
        let current = i64::from(storage.current_level(item.waste_type));
        i64::from(item.amount) <= capacity - current
    })
}

/// Storages able to hold all of the organization's generated waste, nearest first.
///
/// Storages at equal distance keep their input order.
pub fn rank_available_storages<I>(organization: &Organization, storages: I) -> Vec<AvailableStorage>
where
    I: IntoIterator<Item = Storage>,
{
    let demand = organization.demand();
    let origin = organization.location();

    let mut available: Vec<AvailableStorage> = storages
        .into_iter()
        .filter(|storage| has_sufficient_capacity(storage, &demand))
        .map(|storage| AvailableStorage {
            distance: distance(origin, storage.location()),
            storage_id: storage.id,
            name: storage.name,
            capacities: storage.capacities,
            current_levels: storage.current_levels,
        })
        .collect();

    // sort_by is stable
    available.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    available
}
