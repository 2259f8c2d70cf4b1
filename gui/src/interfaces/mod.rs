pub mod trackviz_interface;
