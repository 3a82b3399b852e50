mod cancel_tests;
