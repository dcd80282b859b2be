use inventory_core::{InventoryError, NameScope};
use inventory_model::{CycleType, RoomType};
use inventory_test_utils::{setup_controller, ApiCall, InMemoryInventoryApi};
use proptest::prelude::*;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_duplicate_room_name_never_changes_rooms(
        names in prop::collection::vec("[A-C][a-c]{0,2}", 1..12),
    ) {
        let api = Arc::new(InMemoryInventoryApi::new());
        let controller = setup_controller(Arc::clone(&api));
        let rt = runtime();

        rt.block_on(async {
            controller.start_walkthrough(CycleType::Entry).await.unwrap();
            let mut seen: Vec<String> = Vec::new();

            for name in &names {
                let before = controller.get_rooms().len();
                let result = controller.add_room(name, RoomType::Other).await;

                if seen.contains(name) {
                    let is_duplicate_room = matches!(
                        result,
                        Err(InventoryError::DuplicateName { scope: NameScope::Rooms, .. })
                    );
                    prop_assert!(is_duplicate_room);
                    prop_assert_eq!(controller.get_rooms().len(), before);
                } else {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(controller.get_rooms().len(), before + 1);
                    seen.push(name.clone());
                }
            }

            prop_assert_eq!(api.calls(ApiCall::CreateRoom), seen.len());
            Ok(())
        })?;
    }
}
