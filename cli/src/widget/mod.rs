pub mod selectable_list;
