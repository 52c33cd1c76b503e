mod matching_scenarios;
